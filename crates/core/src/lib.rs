#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progression;
pub mod time;

pub use error::Error;
pub use progression::{ProgressionEngine, ProgressionError, Transition};
pub use time::Clock;
