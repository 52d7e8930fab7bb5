// Snapshot construction for a single job

use crate::errors::SchedulerError;
use crate::identity::ProcessIdentity;
use crate::models::{
    ExecutionContext, JobDefinition, JobSnapshot, Trigger, TriggerKind, TriggerSummary,
};
use crate::registry::SchedulerHandle;
use chrono::{DateTime, Utc};

/// Value of `elapsed_time_ms` and `repeat_interval_ms` when not applicable
pub const NOT_APPLICABLE: i64 = -1;

/// Builds immutable job snapshots stamped with the process identity
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    identity: ProcessIdentity,
}

impl SnapshotBuilder {
    pub fn new(identity: ProcessIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// Snapshot `job` using the triggers and pause flags `scheduler` reports for it
    pub fn build(
        &self,
        scheduler: &dyn SchedulerHandle,
        job: &JobDefinition,
        context: Option<&ExecutionContext>,
        now: DateTime<Utc>,
    ) -> Result<JobSnapshot, SchedulerError> {
        let triggers = scheduler.triggers_of_job(&job.key)?;
        self.build_from_triggers(
            job,
            context,
            &triggers,
            |trigger| scheduler.is_trigger_paused(&trigger.key),
            now,
        )
    }

    /// Snapshot `job` from an explicit trigger set.
    ///
    /// `is_paused` is asked for each trigger until one reports not paused.
    pub fn build_from_triggers<F>(
        &self,
        job: &JobDefinition,
        context: Option<&ExecutionContext>,
        triggers: &[Trigger],
        is_paused: F,
        now: DateTime<Utc>,
    ) -> Result<JobSnapshot, SchedulerError>
    where
        F: FnMut(&Trigger) -> Result<bool, SchedulerError>,
    {
        let summary = merge_triggers(triggers, is_paused)?;
        let global_job_id = self.identity.global_job_id(&job.key);

        Ok(JobSnapshot::new(
            job,
            elapsed_time_ms(context, now),
            summary,
            global_job_id,
        ))
    }
}

fn elapsed_time_ms(context: Option<&ExecutionContext>, now: DateTime<Utc>) -> i64 {
    match context {
        // A fire time ahead of `now` (clock skew) still counts as running
        Some(context) => (now - context.fire_time).num_milliseconds().max(0),
        None => NOT_APPLICABLE,
    }
}

// Same-kind triggers: the last one enumerated wins.
fn merge_triggers<F>(triggers: &[Trigger], mut is_paused: F) -> Result<TriggerSummary, SchedulerError>
where
    F: FnMut(&Trigger) -> Result<bool, SchedulerError>,
{
    let mut cron_expression = None;
    let mut repeat_interval_ms = NOT_APPLICABLE;
    let mut paused = true;

    for trigger in triggers {
        match &trigger.kind {
            TriggerKind::Cron { expression } => cron_expression = Some(expression.clone()),
            TriggerKind::FixedInterval { interval_ms } => repeat_interval_ms = *interval_ms,
            TriggerKind::Other => {}
        }
        paused = paused && is_paused(trigger)?;
    }

    Ok(TriggerSummary {
        previous_fire_time: triggers.iter().filter_map(|t| t.previous_fire_time).max(),
        next_fire_time: triggers.iter().filter_map(|t| t.next_fire_time).min(),
        repeat_interval_ms,
        cron_expression,
        paused,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobKey, TriggerKey};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn identity() -> ProcessIdentity {
        ProcessIdentity::new("1234", "10.0.0.5")
    }

    fn job() -> JobDefinition {
        JobDefinition::new(JobKey::new("grp", "job1"), "app::jobs::Report")
            .with_description("hourly report")
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn trigger(name: &str, kind: TriggerKind) -> Trigger {
        Trigger {
            key: TriggerKey::new("grp", name),
            job_key: JobKey::new("grp", "job1"),
            kind,
            previous_fire_time: None,
            next_fire_time: None,
        }
    }

    fn never_paused(_: &Trigger) -> Result<bool, SchedulerError> {
        Ok(false)
    }

    fn always_paused(_: &Trigger) -> Result<bool, SchedulerError> {
        Ok(true)
    }

    #[test]
    fn test_zero_triggers() {
        let builder = SnapshotBuilder::new(identity());
        let snapshot = builder
            .build_from_triggers(&job(), None, &[], never_paused, base_time())
            .unwrap();

        assert!(snapshot.is_paused());
        assert_eq!(snapshot.next_fire_time(), None);
        assert_eq!(snapshot.previous_fire_time(), None);
        assert_eq!(snapshot.repeat_interval_ms(), -1);
        assert_eq!(snapshot.cron_expression(), None);
        assert_eq!(snapshot.elapsed_time_ms(), -1);
    }

    #[test]
    fn test_copies_job_definition() {
        let builder = SnapshotBuilder::new(identity());
        let snapshot = builder
            .build_from_triggers(&job(), None, &[], never_paused, base_time())
            .unwrap();

        assert_eq!(snapshot.group(), "grp");
        assert_eq!(snapshot.name(), "job1");
        assert_eq!(snapshot.description(), Some("hourly report"));
        assert_eq!(snapshot.job_class_name(), "app::jobs::Report");
        assert_eq!(
            snapshot.global_job_id(),
            identity().global_job_id(&JobKey::new("grp", "job1"))
        );
    }

    #[test]
    fn test_executing_cron_job() {
        let now = base_time();
        let context = ExecutionContext::new(job(), now - Duration::milliseconds(5000));
        let triggers = [trigger(
            "cron",
            TriggerKind::Cron {
                expression: "0 0 * * * ?".to_string(),
            },
        )];

        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(&job(), Some(&context), &triggers, never_paused, now)
            .unwrap();

        assert_eq!(snapshot.elapsed_time_ms(), 5000);
        assert!(snapshot.is_currently_executing());
        assert_eq!(snapshot.cron_expression(), Some("0 0 * * * ?"));
        assert!(!snapshot.is_paused());
        assert_eq!(snapshot.repeat_interval_ms(), -1);
    }

    #[test]
    fn test_fire_time_after_now_still_executing() {
        let now = base_time();
        let context = ExecutionContext::new(job(), now + Duration::milliseconds(1));

        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(&job(), Some(&context), &[], never_paused, now)
            .unwrap();

        assert_eq!(snapshot.elapsed_time_ms(), 0);
        assert!(snapshot.is_currently_executing());
    }

    #[test]
    fn test_last_trigger_of_each_kind_wins() {
        let triggers = [
            trigger("c1", TriggerKind::Cron { expression: "0 0 1 * * ?".to_string() }),
            trigger("s1", TriggerKind::FixedInterval { interval_ms: 1000 }),
            trigger("c2", TriggerKind::Cron { expression: "0 0 2 * * ?".to_string() }),
            trigger("s2", TriggerKind::FixedInterval { interval_ms: 2000 }),
            trigger("o1", TriggerKind::Other),
        ];

        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(&job(), None, &triggers, always_paused, base_time())
            .unwrap();

        assert_eq!(snapshot.cron_expression(), Some("0 0 2 * * ?"));
        assert_eq!(snapshot.repeat_interval_ms(), 2000);
        assert!(snapshot.is_paused());
    }

    #[test]
    fn test_single_running_trigger_unpauses_job() {
        let triggers = [
            trigger("t1", TriggerKind::Other),
            trigger("t2", TriggerKind::Other),
            trigger("t3", TriggerKind::Other),
        ];
        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(
                &job(),
                None,
                &triggers,
                |t| Ok(t.key.name != "t2"),
                base_time(),
            )
            .unwrap();
        assert!(!snapshot.is_paused());
    }

    #[test]
    fn test_pause_lookup_stops_after_first_running_trigger() {
        let triggers = [trigger("t1", TriggerKind::Other), trigger("t2", TriggerKind::Other)];
        let result = SnapshotBuilder::new(identity()).build_from_triggers(
            &job(),
            None,
            &triggers,
            |t| {
                if t.key.name == "t1" {
                    Ok(false)
                } else {
                    Err(SchedulerError::UnknownTrigger(t.key.to_string()))
                }
            },
            base_time(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_pause_lookup_failure_propagates() {
        let triggers = [trigger("t1", TriggerKind::Other)];
        let result = SnapshotBuilder::new(identity()).build_from_triggers(
            &job(),
            None,
            &triggers,
            |t| Err(SchedulerError::UnknownTrigger(t.key.to_string())),
            base_time(),
        );
        assert!(matches!(result, Err(SchedulerError::UnknownTrigger(_))));
    }

    #[test]
    fn test_fire_time_aggregates_ignore_missing_values() {
        let t0 = base_time();
        let mut a = trigger("a", TriggerKind::Other);
        a.next_fire_time = Some(t0 + Duration::hours(3));
        a.previous_fire_time = Some(t0 - Duration::hours(3));
        let b = trigger("b", TriggerKind::Other);
        let mut c = trigger("c", TriggerKind::Other);
        c.next_fire_time = Some(t0 + Duration::hours(1));
        c.previous_fire_time = Some(t0 - Duration::hours(1));

        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(&job(), None, &[a, b, c], never_paused, t0)
            .unwrap();

        assert_eq!(snapshot.next_fire_time(), Some(t0 + Duration::hours(1)));
        assert_eq!(snapshot.previous_fire_time(), Some(t0 - Duration::hours(1)));
    }

    #[test]
    fn test_fire_times_absent_when_no_trigger_reports_them() {
        let triggers = [trigger("a", TriggerKind::Other), trigger("b", TriggerKind::Other)];
        let snapshot = SnapshotBuilder::new(identity())
            .build_from_triggers(&job(), None, &triggers, never_paused, base_time())
            .unwrap();
        assert_eq!(snapshot.next_fire_time(), None);
        assert_eq!(snapshot.previous_fire_time(), None);
    }

    fn offsets() -> impl Strategy<Value = Vec<(Option<i64>, Option<i64>, bool)>> {
        prop::collection::vec(
            (
                prop::option::of(0i64..1_000_000),
                prop::option::of(0i64..1_000_000),
                any::<bool>(),
            ),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_trigger_merge_aggregates(entries in offsets()) {
            let t0 = base_time();
            let mut paused_keys = HashSet::new();
            let triggers: Vec<Trigger> = entries
                .iter()
                .enumerate()
                .map(|(i, (prev, next, paused))| {
                    let mut t = trigger(&format!("t{}", i), TriggerKind::Other);
                    t.previous_fire_time = prev.map(|ms| t0 - Duration::milliseconds(ms));
                    t.next_fire_time = next.map(|ms| t0 + Duration::milliseconds(ms));
                    if *paused {
                        paused_keys.insert(t.key.clone());
                    }
                    t
                })
                .collect();

            let snapshot = SnapshotBuilder::new(identity())
                .build_from_triggers(&job(), None, &triggers, |t| Ok(paused_keys.contains(&t.key)), t0)
                .unwrap();

            let expected_next = entries.iter().filter_map(|e| e.1).min().map(|ms| t0 + Duration::milliseconds(ms));
            let expected_previous = entries.iter().filter_map(|e| e.0).min().map(|ms| t0 - Duration::milliseconds(ms));
            prop_assert_eq!(snapshot.next_fire_time(), expected_next);
            prop_assert_eq!(snapshot.previous_fire_time(), expected_previous);
            prop_assert_eq!(snapshot.is_paused(), entries.iter().all(|e| e.2));
        }

        #[test]
        fn prop_elapsed_time_matches_fire_start(ago_ms in 0i64..86_400_000) {
            let now = base_time();
            let context = ExecutionContext::new(job(), now - Duration::milliseconds(ago_ms));
            let builder = SnapshotBuilder::new(identity());

            let running = builder.build_from_triggers(&job(), Some(&context), &[], never_paused, now).unwrap();
            prop_assert_eq!(running.elapsed_time_ms(), ago_ms);
            prop_assert!(running.is_currently_executing());

            let idle = builder.build_from_triggers(&job(), None, &[], never_paused, now).unwrap();
            prop_assert_eq!(idle.elapsed_time_ms(), -1);
        }
    }
}
