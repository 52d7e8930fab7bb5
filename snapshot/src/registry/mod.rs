// Query interface over the in-process job scheduling system

pub mod memory;

pub use memory::{InMemoryRegistry, InMemoryScheduler};

use crate::config::SchedulingConfig;
use crate::errors::{SchedulerError, SnapshotError};
use crate::models::{ExecutionContext, JobDefinition, JobKey, Trigger, TriggerKey};
use std::fmt;
use std::sync::Arc;

/// A live scheduler instance, queried read-only
#[cfg_attr(test, mockall::automock)]
pub trait SchedulerHandle: Send + Sync {
    /// Name the scheduler was registered under
    fn name(&self) -> String;

    /// Jobs that are mid-execution right now
    fn currently_executing_jobs(&self) -> Result<Vec<ExecutionContext>, SchedulerError>;

    /// Full static job catalog
    fn all_jobs(&self) -> Result<Vec<JobDefinition>, SchedulerError>;

    /// Triggers configured for `job`, in the backend's enumeration order
    fn triggers_of_job(&self, job: &JobKey) -> Result<Vec<Trigger>, SchedulerError>;

    fn is_trigger_paused(&self, trigger: &TriggerKey) -> Result<bool, SchedulerError>;
}

/// Lookup of every scheduler living in the process
pub trait SchedulerRegistry: Send + Sync {
    fn lookup_all(&self) -> Result<Vec<Arc<dyn SchedulerHandle>>, SnapshotError>;
}

/// Whether job scheduling exists in this process, decided once at startup
#[derive(Clone)]
pub enum SchedulingCapability {
    Available(Arc<dyn SchedulerRegistry>),
    Unavailable,
}

impl SchedulingCapability {
    /// Resolve the capability from configuration and the registry the host built
    pub fn from_settings(
        config: &SchedulingConfig,
        registry: Option<Arc<dyn SchedulerRegistry>>,
    ) -> Self {
        match registry {
            Some(registry) if config.enabled => SchedulingCapability::Available(registry),
            _ => {
                tracing::info!("Job scheduling not available, job snapshots disabled");
                SchedulingCapability::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SchedulingCapability::Available(_))
    }
}

impl fmt::Debug for SchedulingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingCapability::Available(_) => f.write_str("Available"),
            SchedulingCapability::Unavailable => f.write_str("Unavailable"),
        }
    }
}
