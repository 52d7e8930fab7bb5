// Trigger construction and fire time calculation
//
// Builds the trigger shapes an in-process scheduler hands to the snapshot
// builder, deriving next fire times for cron and fixed-interval triggers.

use crate::errors::ScheduleError;
use crate::models::{JobKey, Trigger, TriggerKey, TriggerKind};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression (Quartz syntax, second precision)
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Next occurrence of `expression` strictly after `reference`, evaluated in `timezone`
pub fn next_cron_fire_time(
    expression: &str,
    timezone: Tz,
    reference: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;
    let reference_in_tz = reference.with_timezone(&timezone);

    Ok(schedule
        .after(&reference_in_tz)
        .next()
        .map(|next| next.with_timezone(&Utc)))
}

/// Timezone used for cron triggers when none is configured
pub fn default_timezone() -> Tz {
    chrono_tz::UTC
}

impl Trigger {
    /// Cron trigger; the next fire time follows the last fire, or now if it never fired
    pub fn cron(
        key: TriggerKey,
        job_key: JobKey,
        expression: &str,
        timezone: Tz,
        previous_fire_time: Option<DateTime<Utc>>,
    ) -> Result<Self, ScheduleError> {
        let reference = previous_fire_time.unwrap_or_else(Utc::now);
        let next_fire_time = next_cron_fire_time(expression, timezone, reference)?;

        Ok(Self {
            key,
            job_key,
            kind: TriggerKind::Cron {
                expression: expression.to_string(),
            },
            previous_fire_time,
            next_fire_time,
        })
    }

    /// Fixed-interval trigger firing every `interval_ms` from `start_time`
    pub fn fixed_interval(
        key: TriggerKey,
        job_key: JobKey,
        interval_ms: i64,
        start_time: DateTime<Utc>,
        previous_fire_time: Option<DateTime<Utc>>,
    ) -> Result<Self, ScheduleError> {
        if interval_ms <= 0 {
            return Err(ScheduleError::InvalidRepeatInterval(interval_ms));
        }

        let next_fire_time = match previous_fire_time {
            Some(previous) => Duration::try_milliseconds(interval_ms)
                .and_then(|interval| previous.checked_add_signed(interval))
                .ok_or(ScheduleError::InvalidRepeatInterval(interval_ms))?,
            None => start_time,
        };

        Ok(Self {
            key,
            job_key,
            kind: TriggerKind::FixedInterval { interval_ms },
            previous_fire_time,
            next_fire_time: Some(next_fire_time),
        })
    }

    /// Trigger of any other kind, with fire times supplied by the backend
    pub fn other(
        key: TriggerKey,
        job_key: JobKey,
        previous_fire_time: Option<DateTime<Utc>>,
        next_fire_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            job_key,
            kind: TriggerKind::Other,
            previous_fire_time,
            next_fire_time,
        }
    }
}
