//! Time utilities for examclock
//!
//! All timing in examclock is wall-clock based: exam end times are shown
//! to candidates as clock times, so they must follow the system clock.
//! The timing core never reads the clock itself; callers read it once via
//! [`now`] and pass the instant down.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `EXAMCLOCK_MOCK_TIME` environment variable can be set
//! to override the system time. The mock clock advances at the same rate as
//! real time, which makes it practical for rehearsing auto-start and
//! auto-finish behaviour.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-08-12 08:55:00`)
//!
//! Example:
//! ```bash
//! EXAMCLOCK_MOCK_TIME="2025-08-12 08:55:00" examclockd
//! ```

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

use crate::{ExamClockError, Result};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "EXAMCLOCK_MOCK_TIME";

/// Offset between mock time and real time, captured once at first use.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => match Local.from_local_datetime(&naive_dt).single() {
                        Some(mock_dt) => {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        None => {
                            tracing::warn!(
                                mock_time = %mock_time_str,
                                "Failed to convert mock time to local timezone"
                            );
                        }
                    },
                    Err(_) => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = "%Y-%m-%d %H:%M:%S",
                            "Invalid mock time format"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Wall-clock time elapsed from `start` to `now`, zero if `start` is later.
pub fn elapsed_since(start: DateTime<Local>, now: DateTime<Local>) -> Duration {
    now.signed_duration_since(start)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Shift an instant forward by a std duration. Out-of-range shifts leave it unchanged.
pub fn add_duration(dt: DateTime<Local>, duration: Duration) -> DateTime<Local> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| dt.checked_add_signed(delta))
        .unwrap_or(dt)
}

/// Signed milliseconds from `now` until `target` (negative once passed).
pub fn millis_until(target: DateTime<Local>, now: DateTime<Local>) -> i64 {
    target.signed_duration_since(now).num_milliseconds()
}

/// Format a clock time the way the exam room display shows it.
///
/// 24-hour: `09:05` / `09:05:03`. 12-hour: `9:05 am` / `9:05:03 am`.
pub fn format_clock_time(dt: &DateTime<Local>, is_24hr: bool, show_seconds: bool) -> String {
    let pattern = match (is_24hr, show_seconds) {
        (true, true) => "%H:%M:%S",
        (true, false) => "%H:%M",
        (false, true) => "%-I:%M:%S %P",
        (false, false) => "%-I:%M %P",
    };
    dt.format(pattern).to_string()
}

/// Format a countdown in milliseconds as `H:MM:SS`, or `MM:SS` under an hour.
/// Negative values display as zero.
pub fn format_countdown(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Long date for the display header, e.g. `Friday 17 October 2025`.
pub fn format_date_long(dt: &DateTime<Local>) -> String {
    dt.format("%A %-d %B %Y").to_string()
}

/// Short day/month/year date used in session logs.
pub fn format_date_short(dt: &DateTime<Local>) -> String {
    dt.format("%d/%m/%Y").to_string()
}

/// ISO date used in export file names.
pub fn format_date_iso(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Format a DateTime with full date and time, for logs and diagnostics.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Resolve an `HH:MM` auto-start time to an instant today.
///
/// The time must lie strictly in the future relative to `now`.
pub fn auto_start_target_today(value: &str, now: DateTime<Local>) -> Result<DateTime<Local>> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| ExamClockError::invalid_time(value, e.to_string()))?;

    let naive = now.date_naive().and_time(time);
    let target = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ExamClockError::invalid_time(value, "time does not exist today"))?;

    if target <= now {
        return Err(ExamClockError::invalid_time(
            value,
            "start time must be in the future",
        ));
    }

    Ok(target)
}
