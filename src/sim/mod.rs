pub mod body;
pub mod event;
pub mod level;
pub mod progress;
pub mod spawner;
pub mod step;
pub mod world;
