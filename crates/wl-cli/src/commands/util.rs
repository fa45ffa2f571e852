//! Shared parsing and formatting helpers for CLI commands.

use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use wl_core::{EntryFilter, ProjectId, UserId};

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Pre-compiled regex for "1h30m"-style durations.
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:(\d+)h)?\s*(?:(\d+)m)?$").unwrap());

/// Conservative bound for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as either RFC 3339 or relative time.
///
/// Supports:
/// - RFC 3339: "2024-03-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s.trim()) else {
        bail!(
            "invalid datetime: {s}. Use RFC 3339 (e.g., 2024-03-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;
    let minutes_per_unit = match &caps[2] {
        "minute" => 1,
        "hour" => 60,
        "day" => 60 * 24,
        "week" => 60 * 24 * 7,
        unit => bail!("unknown time unit: {unit}"),
    };

    let minutes = n
        .checked_mul(minutes_per_unit)
        .filter(|m| *m <= MAX_RELATIVE_MINUTES)
        .with_context(|| format!("relative time value too large: {s}"))?;
    Ok(Utc::now() - Duration::minutes(minutes))
}

/// Parse a date as YYYY-MM-DD, "today", or "yesterday".
pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    match s.trim() {
        "today" => Ok(Utc::now().date_naive()),
        "yesterday" => Utc::now()
            .date_naive()
            .pred_opt()
            .context("date out of range"),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .with_context(|| format!("invalid date: {s}. Use YYYY-MM-DD, 'today', or 'yesterday'")),
    }
}

/// Parse a duration as "1h30m", "45m", "2h", or a plain number of minutes.
pub(crate) fn parse_duration_seconds(s: &str) -> Result<i64> {
    let trimmed = s.trim();
    if let Ok(minutes) = trimmed.parse::<i64>() {
        if minutes <= 0 {
            bail!("duration must be positive: {s}");
        }
        return minutes
            .checked_mul(60)
            .with_context(|| format!("duration too large: {s}"));
    }

    let caps = DURATION_RE
        .captures(trimmed)
        .filter(|caps| caps.get(1).is_some() || caps.get(2).is_some());
    let Some(caps) = caps else {
        bail!("invalid duration: {s}. Use minutes (90), '1h30m', '45m', or '2h'");
    };

    let hours: i64 = caps.get(1).map_or(Ok(0), |m| m.as_str().parse())?;
    let minutes: i64 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse())?;
    let seconds = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .with_context(|| format!("duration too large: {s}"))?;
    if seconds <= 0 {
        bail!("duration must be positive: {s}");
    }
    Ok(seconds)
}

/// Build the report/export filter from raw CLI arguments.
pub(crate) fn entry_filter(
    from: Option<&str>,
    to: Option<&str>,
    project: Option<&str>,
    user: Option<&str>,
) -> Result<EntryFilter> {
    Ok(EntryFilter {
        from: from.map(parse_date).transpose()?,
        to: to.map(parse_date).transpose()?,
        project: project.map(ProjectId::new).transpose()?,
        user: user.map(UserId::new).transpose()?,
    })
}

/// Human-readable duration: "2h 05m", "45m", "2m 30s", "59s".
pub(crate) fn format_duration(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 && seconds > 0 {
        format!("{minutes}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// Elapsed time as a clock, for the live watch display: "1:02:09".
pub(crate) fn format_clock(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    format!(
        "{}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_accepts_rfc3339() {
        let dt = parse_datetime("2024-03-15T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-15T10:30:00+00:00");
    }

    #[test]
    fn parse_datetime_accepts_relative_phrases() {
        let two_hours = parse_datetime("2 hours ago").unwrap();
        let delta = Utc::now() - two_hours;
        assert!((delta.num_minutes() - 120).abs() <= 1);

        assert!(parse_datetime("1 week ago").is_ok());
        assert!(parse_datetime("next tuesday").is_err());
    }

    #[test]
    fn parse_datetime_rejects_absurd_relative_values() {
        assert!(parse_datetime("99999999999999 weeks ago").is_err());
    }

    #[test]
    fn parse_date_handles_literal_and_named_days() {
        assert_eq!(
            parse_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert_eq!(parse_date("today").unwrap(), Utc::now().date_naive());
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn parse_duration_accepts_common_spellings() {
        assert_eq!(parse_duration_seconds("90").unwrap(), 5400);
        assert_eq!(parse_duration_seconds("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration_seconds("45m").unwrap(), 2700);
        assert_eq!(parse_duration_seconds("2h").unwrap(), 7200);
    }

    #[test]
    fn parse_duration_rejects_junk_and_non_positive_values() {
        assert!(parse_duration_seconds("0").is_err());
        assert!(parse_duration_seconds("-5").is_err());
        assert!(parse_duration_seconds("").is_err());
        assert!(parse_duration_seconds("h30").is_err());
        assert!(parse_duration_seconds("ninety").is_err());
    }

    #[test]
    fn entry_filter_parses_all_fields() {
        let filter =
            entry_filter(Some("2024-03-01"), Some("2024-03-31"), Some("p1"), None).unwrap();
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(filter.to, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(filter.project.unwrap().as_str(), "p1");
        assert!(filter.user.is_none());
    }

    #[test]
    fn format_duration_picks_the_right_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(150), "2m 30s");
        assert_eq!(format_duration(1800), "30m");
        assert_eq!(format_duration(3600), "1h 00m");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(-10), "0s");
    }

    #[test]
    fn format_clock_is_h_mm_ss() {
        assert_eq!(format_clock(0), "0:00:00");
        assert_eq!(format_clock(69), "0:01:09");
        assert_eq!(format_clock(3729), "1:02:09");
    }
}
