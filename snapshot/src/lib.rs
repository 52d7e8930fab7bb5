// Point-in-time snapshots of scheduled jobs for monitoring agents

pub mod builder;
pub mod config;
pub mod enumerator;
pub mod errors;
pub mod identity;
pub mod models;
pub mod registry;
pub mod schedule;
pub mod service;
pub mod telemetry;

pub use builder::SnapshotBuilder;
pub use enumerator::{ExecutingJobs, SchedulerEnumerator};
pub use errors::{ScheduleError, SchedulerError, SnapshotError};
pub use identity::ProcessIdentity;
pub use models::{
    ExecutionContext, JobDefinition, JobKey, JobSnapshot, Trigger, TriggerKey, TriggerKind,
};
pub use registry::{
    InMemoryRegistry, InMemoryScheduler, SchedulerHandle, SchedulerRegistry, SchedulingCapability,
};
pub use service::SnapshotService;
