//! Capture orchestration: target resolution, the single-capture pipeline
//! and the scheduled round over all targets.

pub mod orchestrator;
pub mod service;
pub mod targets;

pub use orchestrator::{CaptureOrchestrator, CaptureOutcome, CaptureStatus};
pub use service::{
    capture_all, repeat_options, schedule_captures, RoundSnapshot, RoundTracker,
};
pub use targets::{build_targets, select_targets, CaptureTarget, TargetKind};
