/// Implicit world grid.
///
/// Cells are `step_x` wide and `step_y` tall; cell `(x, y)` is centred on
/// world `(x * step_x, y * step_y)`. +y is up. Nothing is stored: every
/// mapping is recomputed on demand.

use glam::Vec2;

pub const DEFAULT_STEP_X: f32 = 0.5;
pub const DEFAULT_STEP_Y: f32 = 1.0;

/// Overlap samples cover this fraction of a cell.
const SAMPLE_FILL: f32 = 0.8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        GridPos { x, y }
    }

    pub fn up(self) -> Self {
        GridPos::new(self.x, self.y + 1)
    }

    pub fn down(self) -> Self {
        GridPos::new(self.x, self.y - 1)
    }

    pub fn left(self) -> Self {
        GridPos::new(self.x - 1, self.y)
    }

    pub fn right(self) -> Self {
        GridPos::new(self.x + 1, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        GridPos::new(x, y)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct GridSpec {
    pub step_x: f32,
    pub step_y: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec { step_x: DEFAULT_STEP_X, step_y: DEFAULT_STEP_Y }
    }
}

impl GridSpec {
    pub fn world_to_grid(&self, p: Vec2) -> GridPos {
        GridPos::new(
            (p.x / self.step_x).round() as i32,
            (p.y / self.step_y).round() as i32,
        )
    }

    pub fn grid_to_world(&self, c: GridPos) -> Vec2 {
        Vec2::new(c.x as f32 * self.step_x, c.y as f32 * self.step_y)
    }

    /// Half extents of the overlap box used to classify one cell.
    pub fn sample_half_extents(&self) -> Vec2 {
        Vec2::new(self.step_x, self.step_y) * (SAMPLE_FILL * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_at_cell_centres() {
        let g = GridSpec::default();
        for x in -40..40 {
            for y in -40..40 {
                let c = GridPos::new(x, y);
                assert_eq!(g.world_to_grid(g.grid_to_world(c)), c);
            }
        }
    }

    #[test]
    fn world_to_grid_rounds_to_nearest() {
        let g = GridSpec::default();
        assert_eq!(g.world_to_grid(Vec2::new(0.74, 0.4)), GridPos::new(1, 0));
        assert_eq!(g.world_to_grid(Vec2::new(0.76, 0.6)), GridPos::new(2, 1));
        assert_eq!(g.world_to_grid(Vec2::new(-1.1, -2.2)), GridPos::new(-2, -2));
    }

    #[test]
    fn sample_box_covers_eighty_percent() {
        let g = GridSpec::default();
        let h = g.sample_half_extents();
        assert!((h.x - 0.2).abs() < 1e-6);
        assert!((h.y - 0.4).abs() < 1e-6);
    }

    #[test]
    fn neighbours() {
        let c = GridPos::new(3, 4);
        assert_eq!(c.up(), GridPos::new(3, 5));
        assert_eq!(c.down(), GridPos::new(3, 3));
        assert_eq!(c.left(), GridPos::new(2, 4));
        assert_eq!(c.right(), GridPos::new(4, 4));
    }
}
