pub mod ai;
pub mod classifier;
pub mod entity;
pub mod grid;
pub mod pathfind;
pub mod physics;
pub mod rules;
pub mod steering;
pub mod tile;
