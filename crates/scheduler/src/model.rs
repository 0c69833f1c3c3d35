use std::time::Duration;

/// Loop policy for [`crate::repeat_every`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepeatOptions {
    pub interval: Duration,
    /// Sleep one interval before the first execution.
    pub wait_first: bool,
    /// Record failed executions through `tracing`.
    pub log_errors: bool,
    /// Stop the loop at the first failed execution.
    pub raise_exceptions: bool,
    /// Total executions before returning; `None` repeats forever. Failed
    /// executions count too, and the last one is not followed by a sleep.
    pub max_repetitions: Option<u64>,
}

impl RepeatOptions {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            wait_first: false,
            log_errors: true,
            raise_exceptions: false,
            max_repetitions: None,
        }
    }

    pub fn wait_first(mut self, flag: bool) -> Self {
        self.wait_first = flag;
        self
    }

    pub fn log_errors(mut self, flag: bool) -> Self {
        self.log_errors = flag;
        self
    }

    pub fn raise_exceptions(mut self, flag: bool) -> Self {
        self.raise_exceptions = flag;
        self
    }

    pub fn max_repetitions(mut self, limit: u64) -> Self {
        self.max_repetitions = Some(limit);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepeatSummary {
    pub executions: u64,
    pub failures: u64,
}
