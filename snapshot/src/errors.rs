// Error handling framework

use thiserror::Error;

/// Schedule-related errors raised while building triggers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid repeat interval: {0} ms")]
    InvalidRepeatInterval(i64),
}

/// Errors reported by a scheduler backend while it is being queried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Job store unavailable: {0}")]
    Persistence(String),

    #[error("Scheduler query failed: {0}")]
    QueryFailed(String),

    #[error("Malformed trigger '{trigger}': {reason}")]
    MalformedTrigger { trigger: String, reason: String },

    #[error("Trigger not found: {0}")]
    UnknownTrigger(String),

    #[error("Scheduler already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Scheduler state lock poisoned")]
    LockPoisoned,
}

/// Errors that abort a whole snapshot poll
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Scheduler registry lookup failed: {0}")]
    Registry(String),

    #[error("Snapshot poll failed on scheduler '{scheduler}': {source}")]
    PollFailed {
        scheduler: String,
        #[source]
        source: SchedulerError,
    },
}

impl SnapshotError {
    /// Wrap a backend error raised while polling `scheduler`
    pub fn poll_failed(scheduler: impl Into<String>, source: SchedulerError) -> Self {
        SnapshotError::PollFailed {
            scheduler: scheduler.into(),
            source,
        }
    }
}
