/// Grid path builder — breadth-first search over classified tiles.
///
/// The frontier is plain FIFO, so the returned path has the fewest edges
/// among legal paths. Each node also carries a cumulative move cost
/// (fall 3, ladder 1, ground→ground 1, otherwise 2); it is reported
/// alongside the path but never reorders the search.
///
/// ## Neighbour Truth Table
///
/// ┌────────────┬───────────────┬──────────────────────────────────────┐
/// │ Move       │ From          │ Legal when                           │
/// ├────────────┼───────────────┼──────────────────────────────────────┤
/// │ Left/Right │ any           │ DENY if destination is Obstacle      │
/// │ Left/Right │ Ground        │ dest Ground/Ladder/Rope, or          │
/// │            │               │ Ground/Ladder beneath dest           │
/// │ Left/Right │ Ladder        │ always                               │
/// │ Left/Right │ Rope          │ dest Rope/Ladder                     │
/// │ Left/Right │ Empty         │ never (no air control)               │
/// │ Up         │ Ladder        │ dest Ladder/Empty                    │
/// │ Down       │ Ladder        │ dest Ladder/Empty/Ground             │
/// │ Down       │ not Ground    │ always (gravity)                     │
/// └────────────┴───────────────┴──────────────────────────────────────┘
///
/// ## Budget
///
/// At most `4 × max_path_length` nodes are dequeued. If the goal has not
/// been dequeued by then the search gives up and returns an empty path;
/// callers fall back to the greedy policy.

use std::collections::VecDeque;

use glam::Vec2;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use super::classifier::TileClassifier;
use super::grid::{GridPos, GridSpec};
use super::physics::SpatialQuery;
use super::tile::TileType;

pub const DEFAULT_MAX_PATH_LENGTH: usize = 50;
const EXPANSIONS_PER_STEP: usize = 4;

const COST_FALL: u32 = 3;
const COST_LADDER: u32 = 1;
const COST_WALK: u32 = 1;
const COST_OTHER: u32 = 2;

/// Search node, stored in an arena; `parent` indexes the same arena.
struct PathNode {
    pos: GridPos,
    parent: Option<usize>,
    cost: u32,
}

type Neighbours = SmallVec<[GridPos; 4]>;

#[derive(Clone, Debug)]
pub struct GridPathBuilder {
    classifier: TileClassifier,
    max_path_length: usize,
    last_path: Vec<GridPos>,
    last_cost: Option<u32>,
}

impl GridPathBuilder {
    pub fn new(grid: GridSpec, max_path_length: usize) -> Self {
        GridPathBuilder {
            classifier: TileClassifier::new(grid),
            max_path_length,
            last_path: vec![],
            last_cost: None,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        self.classifier.grid()
    }

    pub fn expansion_budget(&self) -> usize {
        self.max_path_length * EXPANSIONS_PER_STEP
    }

    /// Forward the simulation clock to the tile cache.
    pub fn refresh(&mut self, now: f32) {
        self.classifier.refresh(now);
    }

    pub fn tile_at<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, cell: GridPos) -> TileType {
        self.classifier.classify(world, cell)
    }

    /// Path from the cell containing `start` to the cell containing `goal`,
    /// both ends inclusive. Empty when the goal is not reached in budget.
    pub fn find_path<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, start: Vec2, goal: Vec2) -> Vec<GridPos> {
        let grid = *self.grid();
        let start = grid.world_to_grid(start);
        let goal = grid.world_to_grid(goal);

        self.last_path.clear();
        self.last_cost = None;

        let mut nodes: Vec<PathNode> = vec![PathNode { pos: start, parent: None, cost: 0 }];
        let mut queue: VecDeque<usize> = VecDeque::with_capacity(64);
        let mut visited: FxHashSet<GridPos> = FxHashSet::default();
        queue.push_back(0);
        visited.insert(start);

        let budget = self.expansion_budget();
        let mut expansions = 0;
        let mut reached: Option<usize> = None;

        while expansions < budget {
            let Some(current) = queue.pop_front() else { break };
            expansions += 1;

            let pos = nodes[current].pos;
            if pos == goal {
                reached = Some(current);
                break;
            }

            for next in self.neighbours(world, pos) {
                if visited.insert(next) {
                    let cost = nodes[current].cost + self.move_cost(world, pos, next);
                    nodes.push(PathNode { pos: next, parent: Some(current), cost });
                    queue.push_back(nodes.len() - 1);
                }
            }
        }

        if let Some(end) = reached {
            let mut at = Some(end);
            while let Some(i) = at {
                self.last_path.push(nodes[i].pos);
                at = nodes[i].parent;
            }
            self.last_path.reverse();
            self.last_cost = Some(nodes[end].cost);
        } else {
            log::trace!("path search gave up after {expansions} expansions: {start:?} -> {goal:?}");
        }

        self.last_path.clone()
    }

    /// Most recent result of `find_path`.
    #[cfg(test)]
    pub fn last_path(&self) -> &[GridPos] {
        &self.last_path
    }

    /// Cumulative move cost of the most recent path, if one was found.
    pub fn last_cost(&self) -> Option<u32> {
        self.last_cost
    }

    fn neighbours<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, pos: GridPos) -> Neighbours {
        let mut out = Neighbours::new();
        let here = self.tile_at(world, pos);

        for side in [pos.left(), pos.right()] {
            if self.can_move_horizontally(world, here, side) {
                out.push(side);
            }
        }

        if here.is_ladder() {
            let up = self.tile_at(world, pos.up());
            if matches!(up, TileType::Ladder | TileType::Empty) {
                out.push(pos.up());
            }
            let down = self.tile_at(world, pos.down());
            if matches!(down, TileType::Ladder | TileType::Empty | TileType::Ground) {
                out.push(pos.down());
            }
        } else if !here.is_ground() {
            out.push(pos.down());
        }

        out
    }

    fn can_move_horizontally<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, from: TileType, to: GridPos) -> bool {
        let dest = self.tile_at(world, to);
        if dest.is_obstacle() {
            return false;
        }
        match from {
            TileType::Ground => {
                matches!(dest, TileType::Ground | TileType::Ladder | TileType::Rope)
                    || self.tile_at(world, to.down()).is_footing()
            }
            TileType::Ladder => true,
            TileType::Rope => matches!(dest, TileType::Rope | TileType::Ladder),
            TileType::Empty | TileType::Obstacle => false,
        }
    }

    /// Annotation only: see module docs.
    pub fn move_cost<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, from: GridPos, to: GridPos) -> u32 {
        if to.y < from.y {
            return COST_FALL;
        }
        let a = self.tile_at(world, from);
        let b = self.tile_at(world, to);
        if a.is_ladder() || b.is_ladder() {
            COST_LADDER
        } else if a.is_ground() && b.is_ground() {
            COST_WALK
        } else {
            COST_OTHER
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};

    use super::*;
    use crate::domain::physics::stub::CellWorld;
    use crate::domain::tile::Layer;

    fn builder(w: &CellWorld) -> GridPathBuilder {
        GridPathBuilder::new(w.grid, DEFAULT_MAX_PATH_LENGTH)
    }

    fn at(w: &CellWorld, x: i32, y: i32) -> Vec2 {
        w.grid.grid_to_world(GridPos::new(x, y))
    }

    fn cells(v: &[(i32, i32)]) -> Vec<GridPos> {
        v.iter().map(|&c| GridPos::from(c)).collect()
    }

    #[test]
    fn climbs_straight_up_a_ladder_column() {
        let mut w = CellWorld::new();
        for y in 0..5 {
            w.set(GridPos::new(0, y), Layer::Ladder);
        }
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 0, 5));
        assert_eq!(path, cells(&[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5)]));
        assert_eq!(b.last_path(), path.as_slice());
    }

    #[test]
    fn start_equals_goal_is_single_cell() {
        let w = CellWorld::new();
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 3, 3), at(&w, 3, 3));
        assert_eq!(path, cells(&[(3, 3)]));
        assert_eq!(b.last_cost(), Some(0));
    }

    #[test]
    fn walks_along_ground() {
        let w = CellWorld::from_rows(&["######"]);
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 5, 0));
        assert_eq!(path.len(), 6);
        assert_eq!(b.last_cost(), Some(5));
    }

    #[test]
    fn falls_from_empty_cell() {
        // Empty column above ground: only the gravity edge is legal.
        let w = CellWorld::from_rows(&[" ", " ", "#"]);
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 2), at(&w, 0, 0));
        assert_eq!(path, cells(&[(0, 2), (0, 1), (0, 0)]));
        assert_eq!(b.last_cost(), Some(6));
    }

    #[test]
    fn empty_cell_has_no_horizontal_moves() {
        let w = CellWorld::new();
        let mut b = builder(&w);
        // Only downward falls are ever legal in empty space.
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 1, 0));
        assert!(path.is_empty());
    }

    #[test]
    fn rope_only_continues_to_rope_or_ladder() {
        let w = CellWorld::from_rows(&["--H "]);
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 2, 0));
        assert_eq!(path, cells(&[(0, 0), (1, 0), (2, 0)]));
    }

    #[test]
    fn obstacle_blocks_horizontal() {
        let w = CellWorld::from_rows(&["H", "HX#"]);
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 2, 0));
        assert!(path.is_empty());
    }

    #[test]
    fn unreachable_goal_returns_empty() {
        let w = CellWorld::from_rows(&["#####"]);
        let mut b = builder(&w);
        // Ground never leads upward without a ladder.
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 2, 3));
        assert!(path.is_empty());
        assert_eq!(b.last_cost(), None);
    }

    #[test]
    fn budget_exhaustion_returns_empty() {
        // Long ground strip: goal is 60 steps away but reachable.
        let row = "#".repeat(80);
        let w = CellWorld::from_rows(&[row.as_str()]);
        let mut tight = GridPathBuilder::new(w.grid, 10); // 40 expansions
        assert!(tight.find_path(&w, at(&w, 0, 0), at(&w, 60, 0)).is_empty());

        let mut roomy = builder(&w); // 200 expansions
        assert_eq!(roomy.find_path(&w, at(&w, 0, 0), at(&w, 60, 0)).len(), 61);
    }

    #[test]
    fn ladder_costs_one_per_rung() {
        let w = CellWorld::from_rows(&["H", "H", "H"]);
        let mut b = builder(&w);
        b.find_path(&w, at(&w, 0, 0), at(&w, 0, 2));
        assert_eq!(b.last_cost(), Some(2));
    }

    /// Independent reference BFS with the same legality rules, used to
    /// check that the builder's hop count is minimal.
    fn reference_hops(w: &CellWorld, start: GridPos, goal: GridPos) -> Option<usize> {
        let mut b = builder(w);
        let mut dist: HashMap<GridPos, usize> = HashMap::new();
        let mut q = VecDeque::new();
        dist.insert(start, 0);
        q.push_back(start);
        while let Some(p) = q.pop_front() {
            if p == goal {
                return dist.get(&p).copied();
            }
            if p.y < -5 {
                continue;
            }
            let d = dist[&p];
            for n in b.neighbours(w, p) {
                if !dist.contains_key(&n) {
                    dist.insert(n, d + 1);
                    q.push_back(n);
                }
            }
        }
        None
    }

    #[test]
    fn hop_count_is_minimal() {
        // Two floors joined by a ladder that runs through both.
        let w = CellWorld::from_rows(&[
            "####H####",
            "    H    ",
            "    H    ",
            "####H####",
        ]);
        let pairs = [((0, 0), (8, 3)), ((8, 3), (0, 0)), ((0, 2), (8, 0)), ((2, 1), (4, 3)), ((0, 0), (2, 2))];
        for (s, g) in pairs {
            let mut b = builder(&w);
            let path = b.find_path(&w, at(&w, s.0, s.1), at(&w, g.0, g.1));
            let expected = reference_hops(&w, s.into(), g.into());
            match expected {
                Some(hops) => assert_eq!(path.len(), hops + 1, "{s:?} -> {g:?}"),
                None => assert!(path.is_empty(), "{s:?} -> {g:?}"),
            }
        }
    }

    #[test]
    fn consecutive_cells_are_adjacent() {
        let w = CellWorld::from_rows(&[
            "####H####",
            "    H    ",
            "    H    ",
            "####H####",
        ]);
        let mut b = builder(&w);
        let path = b.find_path(&w, at(&w, 0, 0), at(&w, 8, 3));
        assert_eq!(path.len(), 12);
        for pair in path.windows(2) {
            let d = (pair[1].x - pair[0].x).abs() + (pair[1].y - pair[0].y).abs();
            assert_eq!(d, 1);
        }
    }
}
