//! Expected shift windows on the odd-hour scheduling grid.
//!
//! Shifts start only on odd UTC hours (01:00, 03:00, ..., 23:00) and last a
//! fixed number of hours. A session is matched to the grid slot it started in.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest magnitude accepted for any minute-based setting (one day).
const MAX_MINUTES: i64 = 24 * 60;
const MAX_SHIFT_HOURS: i64 = 24;

/// A compliance setting outside the range the analysis can work with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ComplianceConfigError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Tolerances and thresholds for compliance analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// An `invisible` event only ends a session when the agent stays away
    /// longer than this. Default: 5.
    pub sign_off_gap_minutes: i64,

    /// Arrivals up to this long after the expected start are on time.
    /// Default: 1.
    pub grace_minutes: i64,

    /// Arrivals earlier than this before the expected start are too early.
    /// Default: 5.
    pub early_arrival_tolerance_minutes: i64,

    /// Departures earlier than this before the expected end are early.
    /// Default: 10.
    pub early_leave_tolerance_minutes: i64,

    /// Length of one shift on the grid. Default: 2.
    pub shift_hours: i64,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            sign_off_gap_minutes: 5,
            grace_minutes: 1,
            early_arrival_tolerance_minutes: 5,
            early_leave_tolerance_minutes: 10,
            shift_hours: 2,
        }
    }
}

impl ComplianceConfig {
    /// Checks every setting against its allowed range.
    ///
    /// The duration accessors below assume a validated config.
    pub fn validate(&self) -> Result<(), ComplianceConfigError> {
        check_range("sign_off_gap_minutes", self.sign_off_gap_minutes, 0, MAX_MINUTES)?;
        check_range("grace_minutes", self.grace_minutes, -MAX_MINUTES, MAX_MINUTES)?;
        check_range(
            "early_arrival_tolerance_minutes",
            self.early_arrival_tolerance_minutes,
            -MAX_MINUTES,
            MAX_MINUTES,
        )?;
        check_range(
            "early_leave_tolerance_minutes",
            self.early_leave_tolerance_minutes,
            -MAX_MINUTES,
            MAX_MINUTES,
        )?;
        check_range("shift_hours", self.shift_hours, 1, MAX_SHIFT_HOURS)
    }

    #[must_use]
    pub fn sign_off_gap(&self) -> Duration {
        Duration::minutes(self.sign_off_gap_minutes)
    }

    #[must_use]
    pub fn grace(&self) -> Duration {
        Duration::minutes(self.grace_minutes)
    }

    #[must_use]
    pub fn early_arrival_tolerance(&self) -> Duration {
        Duration::minutes(self.early_arrival_tolerance_minutes)
    }

    #[must_use]
    pub fn early_leave_tolerance(&self) -> Duration {
        Duration::minutes(self.early_leave_tolerance_minutes)
    }

    #[must_use]
    pub fn shift_length(&self) -> Duration {
        Duration::hours(self.shift_hours)
    }
}

fn check_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ComplianceConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ComplianceConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Where a shift was expected to start and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShiftWindow {
    pub expected_start: DateTime<Utc>,
    pub expected_end: DateTime<Utc>,
}

impl ShiftWindow {
    /// The grid slot containing `actual_start`.
    #[must_use]
    pub fn for_start(actual_start: DateTime<Utc>, config: &ComplianceConfig) -> Self {
        let expected_start = round_down_to_odd_hour(actual_start);
        Self {
            expected_start,
            expected_end: expected_start + config.shift_length(),
        }
    }
}

/// Rounds down to the closest odd UTC hour at or before `timestamp`.
///
/// 11:47 becomes 11:00 and 14:05 becomes 13:00. Times in the 00:xx hour fall
/// back to 23:00 of the previous day.
#[must_use]
pub fn round_down_to_odd_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let hour_start = timestamp
        .date_naive()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .map_or(timestamp, |naive| naive.and_utc());
    if hour_start.hour() % 2 == 0 {
        hour_start - Duration::hours(1)
    } else {
        hour_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, min, sec).unwrap()
    }

    #[test]
    fn odd_hour_start_keeps_its_hour() {
        let window = ShiftWindow::for_start(utc(10, 11, 47, 0), &ComplianceConfig::default());
        assert_eq!(window.expected_start, utc(10, 11, 0, 0));
        assert_eq!(window.expected_end, utc(10, 13, 0, 0));
    }

    #[test]
    fn even_hour_start_rounds_to_previous_odd_hour() {
        let window = ShiftWindow::for_start(utc(10, 14, 5, 0), &ComplianceConfig::default());
        assert_eq!(window.expected_start, utc(10, 13, 0, 0));
        assert_eq!(window.expected_end, utc(10, 15, 0, 0));
    }

    #[test]
    fn midnight_hour_rolls_back_to_previous_day() {
        assert_eq!(round_down_to_odd_hour(utc(10, 0, 20, 0)), utc(9, 23, 0, 0));
    }

    #[test]
    fn sub_second_precision_is_dropped() {
        let ts = utc(10, 3, 59, 59) + Duration::milliseconds(999);
        assert_eq!(round_down_to_odd_hour(ts), utc(10, 3, 0, 0));
    }

    #[test]
    fn shift_length_follows_config() {
        let config = ComplianceConfig {
            shift_hours: 4,
            ..ComplianceConfig::default()
        };
        let window = ShiftWindow::for_start(utc(10, 5, 0, 0), &config);
        assert_eq!(window.expected_end, utc(10, 9, 0, 0));
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ComplianceConfig::default().validate(), Ok(()));

        let negative_arrival = ComplianceConfig {
            early_arrival_tolerance_minutes: -30,
            ..ComplianceConfig::default()
        };
        assert_eq!(negative_arrival.validate(), Ok(()));
    }

    #[test]
    fn out_of_range_tolerance_is_rejected_before_use() {
        let config: ComplianceConfig =
            serde_json::from_str(r#"{"grace_minutes": 9223372036854775807}"#).unwrap();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ComplianceConfigError::OutOfRange {
                field: "grace_minutes",
                value: i64::MAX,
                min: -1440,
                max: 1440,
            }
        );
        assert!(err.to_string().starts_with("grace_minutes must be between"));
    }

    #[test]
    fn shift_length_and_gap_bounds() {
        let zero_shift = ComplianceConfig {
            shift_hours: 0,
            ..ComplianceConfig::default()
        };
        assert!(zero_shift.validate().is_err());

        let negative_gap = ComplianceConfig {
            sign_off_gap_minutes: -1,
            ..ComplianceConfig::default()
        };
        assert!(negative_gap.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_partial_overrides() {
        let config: ComplianceConfig =
            serde_json::from_str(r#"{"grace_minutes": 3}"#).unwrap();
        assert_eq!(config.grace_minutes, 3);
        assert_eq!(config.sign_off_gap_minutes, 5);
        assert_eq!(config.early_leave_tolerance_minutes, 10);
    }
}
