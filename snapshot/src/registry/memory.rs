// In-process scheduler registry and passive scheduler catalog

use super::{SchedulerHandle, SchedulerRegistry};
use crate::errors::{SchedulerError, SnapshotError};
use crate::models::{ExecutionContext, JobDefinition, JobKey, Trigger, TriggerKey};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Registry of the schedulers a host process runs, in binding order
#[derive(Default)]
pub struct InMemoryRegistry {
    schedulers: RwLock<Vec<Arc<dyn SchedulerHandle>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scheduler; names are unique within the registry
    pub fn bind(&self, scheduler: Arc<dyn SchedulerHandle>) -> Result<(), SchedulerError> {
        let name = scheduler.name();
        let mut schedulers = self
            .schedulers
            .write()
            .map_err(|_| SchedulerError::LockPoisoned)?;

        if schedulers.iter().any(|s| s.name() == name) {
            return Err(SchedulerError::AlreadyRegistered(name));
        }

        info!(scheduler = %name, "Scheduler registered");
        schedulers.push(scheduler);
        Ok(())
    }

    /// Remove the scheduler bound under `name`, returning whether one was bound
    pub fn unbind(&self, name: &str) -> Result<bool, SchedulerError> {
        let mut schedulers = self
            .schedulers
            .write()
            .map_err(|_| SchedulerError::LockPoisoned)?;

        let before = schedulers.len();
        schedulers.retain(|s| s.name() != name);
        Ok(schedulers.len() != before)
    }
}

impl SchedulerRegistry for InMemoryRegistry {
    fn lookup_all(&self) -> Result<Vec<Arc<dyn SchedulerHandle>>, SnapshotError> {
        let schedulers = self
            .schedulers
            .read()
            .map_err(|_| SnapshotError::Registry("scheduler registry lock poisoned".to_string()))?;
        Ok(schedulers.clone())
    }
}

#[derive(Default)]
struct CatalogState {
    jobs: Vec<JobDefinition>,
    triggers: Vec<Trigger>,
    paused: HashSet<TriggerKey>,
    executing: Vec<ExecutionContext>,
}

/// Scheduler catalog fed by its owner.
///
/// Holds job definitions, triggers, pause flags and running executions; it
/// never fires anything itself.
pub struct InMemoryScheduler {
    name: String,
    state: RwLock<CatalogState>,
}

impl InMemoryScheduler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(CatalogState::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>, SchedulerError> {
        self.state.read().map_err(|_| SchedulerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>, SchedulerError> {
        self.state.write().map_err(|_| SchedulerError::LockPoisoned)
    }

    /// Add or replace a job definition
    pub fn add_job(&self, job: JobDefinition) -> Result<(), SchedulerError> {
        let mut state = self.write()?;
        match state.jobs.iter_mut().find(|j| j.key == job.key) {
            Some(existing) => *existing = job,
            None => state.jobs.push(job),
        }
        Ok(())
    }

    /// Remove a job together with its triggers
    pub fn remove_job(&self, key: &JobKey) -> Result<bool, SchedulerError> {
        let mut state = self.write()?;
        let before = state.jobs.len();
        state.jobs.retain(|j| &j.key != key);

        let removed: Vec<TriggerKey> = state
            .triggers
            .iter()
            .filter(|t| &t.job_key == key)
            .map(|t| t.key.clone())
            .collect();
        state.triggers.retain(|t| &t.job_key != key);
        for trigger in &removed {
            state.paused.remove(trigger);
        }

        Ok(state.jobs.len() != before)
    }

    /// Attach a trigger, replacing any trigger with the same key
    pub fn schedule(&self, trigger: Trigger) -> Result<(), SchedulerError> {
        let mut state = self.write()?;
        match state.triggers.iter_mut().find(|t| t.key == trigger.key) {
            Some(existing) => *existing = trigger,
            None => state.triggers.push(trigger),
        }
        Ok(())
    }

    pub fn pause_trigger(&self, key: &TriggerKey) -> Result<(), SchedulerError> {
        let mut state = self.write()?;
        if !state.triggers.iter().any(|t| &t.key == key) {
            return Err(SchedulerError::UnknownTrigger(key.to_string()));
        }
        state.paused.insert(key.clone());
        Ok(())
    }

    pub fn resume_trigger(&self, key: &TriggerKey) -> Result<(), SchedulerError> {
        let mut state = self.write()?;
        if !state.triggers.iter().any(|t| &t.key == key) {
            return Err(SchedulerError::UnknownTrigger(key.to_string()));
        }
        state.paused.remove(key);
        Ok(())
    }

    /// Record that an execution of `context.job` has started
    pub fn job_started(&self, context: ExecutionContext) -> Result<(), SchedulerError> {
        debug!(scheduler = %self.name, job = %context.job.key, "Execution started");
        self.write()?.executing.push(context);
        Ok(())
    }

    /// Record that every running execution of `key` has finished
    pub fn job_finished(&self, key: &JobKey) -> Result<(), SchedulerError> {
        debug!(scheduler = %self.name, job = %key, "Execution finished");
        self.write()?.executing.retain(|c| &c.job.key != key);
        Ok(())
    }
}

impl SchedulerHandle for InMemoryScheduler {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn currently_executing_jobs(&self) -> Result<Vec<ExecutionContext>, SchedulerError> {
        Ok(self.read()?.executing.clone())
    }

    fn all_jobs(&self) -> Result<Vec<JobDefinition>, SchedulerError> {
        Ok(self.read()?.jobs.clone())
    }

    fn triggers_of_job(&self, job: &JobKey) -> Result<Vec<Trigger>, SchedulerError> {
        Ok(self
            .read()?
            .triggers
            .iter()
            .filter(|t| &t.job_key == job)
            .cloned()
            .collect())
    }

    fn is_trigger_paused(&self, trigger: &TriggerKey) -> Result<bool, SchedulerError> {
        let state = self.read()?;
        if !state.triggers.iter().any(|t| &t.key == trigger) {
            return Err(SchedulerError::UnknownTrigger(trigger.to_string()));
        }
        Ok(state.paused.contains(trigger))
    }
}
