use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The unit of work failed and the loop was configured to stop on errors.
    #[error("unit of work failed on execution {execution}: {source}")]
    Fatal {
        execution: u64,
        #[source]
        source: BoxError,
    },
    #[error("repeat interval must be greater than zero")]
    InvalidInterval,
}

impl SchedulerError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SchedulerError::Fatal { .. })
    }
}
