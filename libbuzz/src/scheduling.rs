//! Schedule time parsing
//!
//! Accepts what a person would type at the command line:
//! - RFC 3339 timestamps: "2026-11-20T15:00:00Z"
//! - relative durations: "30m", "2h", "1d 6h"
//! - natural language: "tomorrow", "next monday 10am", "in 1 hour"
//!
//! The parsed time must be in the future.

use chrono::{DateTime, Duration, Utc};

use crate::{BuzzError, Result};

/// Parse a schedule string relative to the current time
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    parse_schedule_at(input, Utc::now())
}

/// Parse a schedule string relative to `now`
///
/// # Errors
///
/// Returns `InvalidInput` if the string is empty, cannot be parsed, or names
/// a time at or before `now`.
pub fn parse_schedule_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(BuzzError::InvalidInput(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    let parsed = match parse_rfc3339(input) {
        Some(parsed) => Some(parsed),
        None => match parse_duration(input) {
            Some(duration) => Some(now.checked_add_signed(duration).ok_or_else(|| {
                BuzzError::InvalidInput(format!("Schedule duration is too large: {}", input))
            })?),
            None => parse_natural_language(input, now),
        },
    }
    .ok_or_else(|| BuzzError::InvalidInput(format!("Could not parse schedule string: {}", input)))?;

    if parsed <= now {
        return Err(BuzzError::InvalidInput(format!(
            "Scheduled time must be in the future (got {})",
            parsed.to_rfc3339()
        )));
    }

    Ok(parsed)
}

fn parse_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_duration(input: &str) -> Option<Duration> {
    let std_duration = humantime::parse_duration(input).ok()?;
    let seconds = i64::try_from(std_duration.as_secs()).ok()?;
    Duration::try_seconds(seconds)
}

fn parse_natural_language(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    chrono_english::parse_date_string(input, now, chrono_english::Dialect::Us).ok()
}
