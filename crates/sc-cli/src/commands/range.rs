//! Query range selection: `this`, `prev`, or an explicit `START_END` pair.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};
use sc_core::TimeRange;

/// The range argument as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// Start of the current week up to the start of the current hour.
    ThisWeek,
    /// The whole previous week.
    PrevWeek,
    /// Explicit bounds.
    Explicit {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl FromStr for RangeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "this" => Ok(Self::ThisWeek),
            "prev" => Ok(Self::PrevWeek),
            _ => {
                let Some((start, end)) = s.split_once('_') else {
                    return Err(format!(
                        "invalid range: {s}. Use this, prev, or START_END (e.g. 2025-03-03_2025-03-10)"
                    ));
                };
                Ok(Self::Explicit {
                    start: parse_bound(start)?,
                    end: parse_bound(end)?,
                })
            }
        }
    }
}

/// Parses one side of an explicit range.
///
/// Supports:
/// - Date: "2025-03-03" (UTC midnight)
/// - ISO 8601: "2025-03-03T09:30:00Z"
fn parse_bound(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    Err(format!(
        "invalid date: {s}. Use YYYY-MM-DD or ISO 8601 (e.g. 2025-03-03T09:30:00Z)"
    ))
}

impl RangeSpec {
    /// Turns the argument into concrete bounds relative to `now`.
    pub fn resolve(&self, now: DateTime<Local>, week_start: Weekday) -> anyhow::Result<TimeRange> {
        let (start, end) = match self {
            Self::ThisWeek => {
                let start = local_to_utc(midnight(week_start_date(now.date_naive(), week_start)));
                (start, start_of_hour(now))
            }
            Self::PrevWeek => {
                let this_week = week_start_date(now.date_naive(), week_start);
                let start = local_to_utc(midnight(this_week - chrono::Duration::days(7)));
                let end = local_to_utc(midnight(this_week)) - chrono::Duration::milliseconds(1);
                (start, end)
            }
            Self::Explicit { start, end } => (*start, *end),
        };
        Ok(TimeRange::new(start, end)?)
    }
}

/// The most recent `week_start` day on or before `today`.
fn week_start_date(today: NaiveDate, week_start: Weekday) -> NaiveDate {
    let days_back = (7 + today.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    today - chrono::Duration::days(i64::from(days_back))
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn start_of_hour(now: DateTime<Local>) -> DateTime<Utc> {
    let naive = now.naive_local();
    let hour = naive
        .date()
        .and_hms_opt(naive.hour(), 0, 0)
        .unwrap_or(naive);
    local_to_utc(hour)
}

/// Converts a local wall-clock time to UTC.
/// Handles DST ambiguity by picking the earlier time.
fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match Local.from_local_datetime(&local) {
        // Single or ambiguous (DST fall-back): use the earlier time
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        // DST spring-forward gap: the wall-clock time does not exist, so
        // step an hour later where it does.
        LocalResult::None => Local
            .from_local_datetime(&(local + chrono::Duration::hours(1)))
            .earliest()
            .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc)),
    }
}
