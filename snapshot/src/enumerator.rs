// Scheduler enumeration: schedulers, running executions and job catalogs

use crate::errors::{SchedulerError, SnapshotError};
use crate::models::{ExecutionContext, JobDefinition};
use crate::registry::{SchedulerHandle, SchedulingCapability};
use crate::telemetry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Running executions of one scheduler keyed by job full name, in query order
#[derive(Debug, Clone, Default)]
pub struct ExecutingJobs {
    entries: Vec<(String, ExecutionContext)>,
    index: HashMap<String, usize>,
}

impl ExecutingJobs {
    /// Insert a context; a later context for the same job replaces the earlier one in place
    pub fn insert(&mut self, full_name: String, context: ExecutionContext) {
        match self.index.get(&full_name) {
            Some(&position) => self.entries[position].1 = context,
            None => {
                self.index.insert(full_name.clone(), self.entries.len());
                self.entries.push((full_name, context));
            }
        }
    }

    pub fn get(&self, full_name: &str) -> Option<&ExecutionContext> {
        self.index
            .get(full_name)
            .map(|&position| &self.entries[position].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExecutionContext)> {
        self.entries.iter().map(|(name, ctx)| (name.as_str(), ctx))
    }
}

/// Read-only query layer over the schedulers of the process
#[derive(Debug, Clone)]
pub struct SchedulerEnumerator {
    capability: SchedulingCapability,
}

impl SchedulerEnumerator {
    pub fn new(capability: SchedulingCapability) -> Self {
        Self { capability }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// Every scheduler registered in the process; empty when scheduling is unavailable
    #[instrument(skip(self))]
    pub fn list_schedulers(&self) -> Result<Vec<Arc<dyn SchedulerHandle>>, SnapshotError> {
        match &self.capability {
            SchedulingCapability::Available(registry) => {
                let schedulers = registry.lookup_all()?;
                debug!(scheduler_count = schedulers.len(), "Schedulers found");
                Ok(schedulers)
            }
            SchedulingCapability::Unavailable => Ok(Vec::new()),
        }
    }

    /// Executions in flight on `scheduler`, keyed by `group.name`
    #[instrument(skip_all, fields(scheduler = %scheduler.name()))]
    pub fn list_executing_contexts(
        &self,
        scheduler: &dyn SchedulerHandle,
    ) -> Result<ExecutingJobs, SchedulerError> {
        let mut executing = ExecutingJobs::default();
        for context in scheduler.currently_executing_jobs()? {
            executing.insert(context.job.full_name(), context);
        }

        debug!(executing_count = executing.len(), "Running executions found");
        Ok(executing)
    }

    /// Job catalog of `scheduler`.
    ///
    /// A failing catalog query (typically a job store that is down) is logged
    /// and yields an empty catalog so other schedulers can still be listed.
    #[instrument(skip_all, fields(scheduler = %scheduler.name()))]
    pub fn list_jobs(&self, scheduler: &dyn SchedulerHandle) -> Vec<JobDefinition> {
        match scheduler.all_jobs() {
            Ok(jobs) => {
                debug!(job_count = jobs.len(), "Job catalog loaded");
                jobs
            }
            Err(e) => {
                let name = scheduler.name();
                warn!(scheduler = %name, error = %e, "Failed to list jobs, skipping scheduler");
                telemetry::record_catalog_failure(&name);
                Vec::new()
            }
        }
    }
}
