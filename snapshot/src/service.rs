// Poll orchestration: one snapshot per job across every scheduler

use crate::builder::SnapshotBuilder;
use crate::config::Settings;
use crate::enumerator::SchedulerEnumerator;
use crate::errors::SnapshotError;
use crate::identity::ProcessIdentity;
use crate::models::JobSnapshot;
use crate::registry::{SchedulerRegistry, SchedulingCapability};
use crate::telemetry;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Entry point used by exporters to poll job snapshots.
///
/// Holds no mutable state; concurrent polls are independent.
#[derive(Debug, Clone)]
pub struct SnapshotService {
    enumerator: SchedulerEnumerator,
    builder: SnapshotBuilder,
}

impl SnapshotService {
    pub fn new(capability: SchedulingCapability, identity: ProcessIdentity) -> Self {
        Self {
            enumerator: SchedulerEnumerator::new(capability),
            builder: SnapshotBuilder::new(identity),
        }
    }

    /// Wire the service from settings and the registry the host process built, if any
    pub fn from_settings(
        settings: &Settings,
        registry: Option<Arc<dyn SchedulerRegistry>>,
    ) -> Self {
        telemetry::describe_metrics();
        let capability = SchedulingCapability::from_settings(&settings.scheduling, registry);
        Self::new(capability, ProcessIdentity::current(&settings.agent))
    }

    pub fn identity(&self) -> &ProcessIdentity {
        self.builder.identity()
    }

    /// Snapshot every job of every scheduler, as of now
    pub fn build_all_snapshots(&self) -> Result<Vec<JobSnapshot>, SnapshotError> {
        self.build_all_snapshots_at(Utc::now())
    }

    /// Snapshot every job of every scheduler, measuring elapsed times against `now`.
    ///
    /// Schedulers come in registry order and jobs in catalog order. A scheduler
    /// whose catalog cannot be read contributes no jobs; any other failure
    /// aborts the whole poll.
    #[instrument(skip(self))]
    pub fn build_all_snapshots_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<JobSnapshot>, SnapshotError> {
        if !self.enumerator.is_available() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for scheduler in self.enumerator.list_schedulers()? {
            let name = scheduler.name();
            let executing = self
                .enumerator
                .list_executing_contexts(scheduler.as_ref())
                .map_err(|e| {
                    error!(scheduler = %name, error = %e, "Failed to list running executions");
                    SnapshotError::poll_failed(name.as_str(), e)
                })?;

            for job in self.enumerator.list_jobs(scheduler.as_ref()) {
                let context = executing.get(&job.full_name());
                let snapshot = self
                    .builder
                    .build(scheduler.as_ref(), &job, context, now)
                    .map_err(|e| {
                        error!(
                            scheduler = %name,
                            job = %job.key,
                            error = %e,
                            "Failed to build job snapshot"
                        );
                        SnapshotError::poll_failed(name.as_str(), e)
                    })?;
                snapshots.push(snapshot);
            }
        }

        debug!(snapshot_count = snapshots.len(), "Job snapshots built");
        telemetry::record_snapshot_count(snapshots.len());
        Ok(snapshots)
    }
}
