pub mod camera;
pub mod cli;
pub mod display;
pub mod loaders;
pub mod math;
pub mod picking;
pub mod player;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod sequence;
pub mod texture;

pub use picking::PickRouter;
pub use player::{PlaybackConfig, PlayerError, SequencePlayer};
pub use scene::RedrawFlag;
pub use schedule::Scheduler;
pub use sequence::{DirLocator, FrameLocator, SequenceId};
