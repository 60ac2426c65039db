/// Tile classifier: world position → `TileType`, via overlap queries.
///
/// Each cell is sampled with a box covering 80% of the cell, against the
/// collision layers in priority order:
///
///   Obstacle > Ground > Ladder > Rope > (nothing) Empty
///
/// First match wins. Results are memoized per cell and the whole cache is
/// dropped every `refresh_interval` seconds of simulated time. A cell read
/// just before a flush may therefore be stale for up to one interval; terrain
/// changes (dig / restore) are slower than that in normal play.

use rustc_hash::FxHashMap;

use super::grid::{GridPos, GridSpec};
use super::physics::SpatialQuery;
use super::tile::{LayerMask, TileType};

pub const CACHE_REFRESH_INTERVAL: f32 = 0.5;

/// Sampling order. Obstacle first so impassable walls are never mistaken
/// for standable ground.
const PRIORITY: [(LayerMask, TileType); 4] = [
    (LayerMask::OBSTACLE, TileType::Obstacle),
    (LayerMask::GROUND, TileType::Ground),
    (LayerMask::LADDER, TileType::Ladder),
    (LayerMask::ROPE, TileType::Rope),
];

#[derive(Clone, Debug)]
pub struct TileClassifier {
    grid: GridSpec,
    cache: FxHashMap<GridPos, TileType>,
    refresh_interval: f32,
    next_flush: f32,
}

impl TileClassifier {
    pub fn new(grid: GridSpec) -> Self {
        TileClassifier {
            grid,
            cache: FxHashMap::default(),
            refresh_interval: CACHE_REFRESH_INTERVAL,
            next_flush: 0.0,
        }
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    /// Drop every cached cell if the flush time has passed.
    /// Call once per frame with the simulation clock.
    pub fn refresh(&mut self, now: f32) {
        if now >= self.next_flush {
            self.cache.clear();
            self.next_flush = now + self.refresh_interval;
        }
    }

    pub fn classify<Q: SpatialQuery + ?Sized>(&mut self, world: &Q, cell: GridPos) -> TileType {
        if let Some(&t) = self.cache.get(&cell) {
            return t;
        }
        let t = sample_cell(world, &self.grid, cell);
        self.cache.insert(cell, t);
        t
    }

    #[cfg(test)]
    pub fn cached_cells(&self) -> usize {
        self.cache.len()
    }
}

/// Uncached classification of one cell.
pub fn sample_cell<Q: SpatialQuery + ?Sized>(world: &Q, grid: &GridSpec, cell: GridPos) -> TileType {
    let center = grid.grid_to_world(cell);
    let half = grid.sample_half_extents();
    PRIORITY
        .iter()
        .find(|(mask, _)| world.overlap_region(center, half, *mask).is_some())
        .map(|&(_, t)| t)
        .unwrap_or(TileType::Empty)
}
