/// Tile classes and collision layers.
/// Tile semantics are queried via methods, not stored as flags,
/// so movement legality reads the same everywhere.

/// What occupies one cell of the implicit world grid.
///
/// Derived data: computed from live overlap queries by the classifier,
/// never authored directly.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum TileType {
    #[default]
    Empty,
    Ground,   // Solid terrain (standable)
    Ladder,   // Climbable
    Rope,     // Hangable (horizontal bar)
    Obstacle, // Impassable for the path search
}

impl TileType {
    pub fn is_ground(self) -> bool {
        matches!(self, TileType::Ground)
    }

    pub fn is_ladder(self) -> bool {
        matches!(self, TileType::Ladder)
    }

    pub fn is_obstacle(self) -> bool {
        matches!(self, TileType::Obstacle)
    }

    /// Ground or Ladder: something a walker can have beneath its feet.
    pub fn is_footing(self) -> bool {
        matches!(self, TileType::Ground | TileType::Ladder)
    }
}

/// Collision category of a collider.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Layer {
    Ground,
    Ladder,
    Rope,
    Obstacle,
    Enemy,
    Player,
}

impl Layer {
    fn bit(self) -> u8 {
        match self {
            Layer::Ground => 1 << 0,
            Layer::Ladder => 1 << 1,
            Layer::Rope => 1 << 2,
            Layer::Obstacle => 1 << 3,
            Layer::Enemy => 1 << 4,
            Layer::Player => 1 << 5,
        }
    }

    /// Does this layer block bodies?
    pub fn is_solid(self) -> bool {
        matches!(self, Layer::Ground | Layer::Obstacle)
    }
}

/// Set of layers a query should consider.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const GROUND: LayerMask = LayerMask(1 << 0);
    pub const LADDER: LayerMask = LayerMask(1 << 1);
    pub const ROPE: LayerMask = LayerMask(1 << 2);
    pub const OBSTACLE: LayerMask = LayerMask(1 << 3);
    pub const ENEMY: LayerMask = LayerMask(1 << 4);
    pub const SOLID: LayerMask = LayerMask((1 << 0) | (1 << 3));

    pub fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

impl From<Layer> for LayerMask {
    fn from(layer: Layer) -> Self {
        LayerMask(layer.bit())
    }
}
