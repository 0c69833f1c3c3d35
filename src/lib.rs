//! Shotter library
//!
//! Exposes modules for integration testing

pub mod capture;
pub mod cli;
pub mod config;
pub mod errors;
pub mod server;

pub use capture::{CaptureOrchestrator, CaptureOutcome, CaptureStatus, CaptureTarget};
pub use config::AppConfig;
pub use errors::{ShotterError, ShotterResult};
