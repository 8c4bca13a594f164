mod engine;
mod handle;

pub use engine::TimerEngine;
pub use handle::{EngineCommand, EngineHandle};
