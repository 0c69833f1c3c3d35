//! Repeat-forever driver for periodic work.

pub mod error;
pub mod model;
pub mod runtime;

pub use error::{BoxError, SchedulerError};
pub use model::{RepeatOptions, RepeatSummary};
pub use runtime::{repeat_every, spawn_repeating};
