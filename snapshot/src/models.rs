use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Scheduler input shapes
// ============================================================================

/// Identity of a job within a scheduler: unique `name` inside a `group`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub group: String,
    pub name: String,
}

impl JobKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Composite `group.name` identity used to correlate executions with jobs
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Identity of a trigger within a scheduler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriggerKey {
    pub group: String,
    pub name: String,
}

impl TriggerKey {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// Static definition of a job as registered in a scheduler catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub key: JobKey,
    pub description: Option<String>,
    /// Fully-qualified name of the type executing the job
    pub job_class: String,
}

impl JobDefinition {
    pub fn new(key: JobKey, job_class: impl Into<String>) -> Self {
        Self {
            key,
            description: None,
            job_class: job_class.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn full_name(&self) -> String {
        self.key.full_name()
    }
}

/// TriggerKind discriminates the firing rule of a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
    Cron { expression: String },
    FixedInterval { interval_ms: i64 },
    Other,
}

/// Trigger attached to a job, as seen at query time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub key: TriggerKey,
    pub job_key: JobKey,
    pub kind: TriggerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_time: Option<DateTime<Utc>>,
}

/// Runtime record of a job currently being executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub job: JobDefinition,
    /// Instant the running execution was fired
    pub fire_time: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(job: JobDefinition, fire_time: DateTime<Utc>) -> Self {
        Self { job, fire_time }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of one scheduled job.
///
/// Built once per poll and never written again, so it can be shared across
/// threads freely and serialized for a remote collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    group: String,
    name: String,
    description: Option<String>,
    job_class_name: String,
    previous_fire_time: Option<DateTime<Utc>>,
    next_fire_time: Option<DateTime<Utc>>,
    elapsed_time_ms: i64,
    repeat_interval_ms: i64,
    cron_expression: Option<String>,
    paused: bool,
    global_job_id: String,
}

/// Trigger aggregates folded into a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TriggerSummary {
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub repeat_interval_ms: i64,
    pub cron_expression: Option<String>,
    pub paused: bool,
}

impl JobSnapshot {
    pub(crate) fn new(
        job: &JobDefinition,
        elapsed_time_ms: i64,
        triggers: TriggerSummary,
        global_job_id: String,
    ) -> Self {
        Self {
            group: job.key.group.clone(),
            name: job.key.name.clone(),
            description: job.description.clone(),
            job_class_name: job.job_class.clone(),
            previous_fire_time: triggers.previous_fire_time,
            next_fire_time: triggers.next_fire_time,
            elapsed_time_ms,
            repeat_interval_ms: triggers.repeat_interval_ms,
            cron_expression: triggers.cron_expression,
            paused: triggers.paused,
            global_job_id,
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn job_class_name(&self) -> &str {
        &self.job_class_name
    }

    /// Latest previous fire time among the job's triggers
    pub fn previous_fire_time(&self) -> Option<DateTime<Utc>> {
        self.previous_fire_time
    }

    /// Earliest next fire time among the job's triggers
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.next_fire_time
    }

    /// Milliseconds since the running execution started, or -1
    pub fn elapsed_time_ms(&self) -> i64 {
        self.elapsed_time_ms
    }

    pub fn is_currently_executing(&self) -> bool {
        self.elapsed_time_ms >= 0
    }

    /// Interval of a fixed-interval trigger, or -1
    pub fn repeat_interval_ms(&self) -> i64 {
        self.repeat_interval_ms
    }

    pub fn cron_expression(&self) -> Option<&str> {
        self.cron_expression.as_deref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn global_job_id(&self) -> &str {
        &self.global_job_id
    }
}

impl fmt::Display for JobSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobSnapshot[name={}, group={}]", self.name, self.group)
    }
}
