//! Classification of sessions against their expected shift window.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::presence::AgentId;
use crate::session::Session;
use crate::shift::{ComplianceConfig, ShiftWindow};

/// A session that breached at least one tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub agent_id: AgentId,
    pub expected_start: DateTime<Utc>,
    pub actual_start: DateTime<Utc>,
    pub expected_end: DateTime<Utc>,
    pub actual_end: DateTime<Utc>,
    /// Arrived after the grace period.
    pub is_late: bool,
    /// Arrived before the early-arrival tolerance.
    pub is_too_early: bool,
    /// Left before the early-leave tolerance.
    pub is_early: bool,
    /// The session had no sign-off, so `actual_end` is its start.
    pub session_open: bool,
}

/// Flag combination of a violation, used to pick the report wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Late,
    TooEarly,
    LeftEarly,
    LateAndLeftEarly,
    TooEarlyAndLeftEarly,
    LateAndTooEarly,
    LateTooEarlyAndLeftEarly,
}

impl ViolationKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::TooEarly => "too_early",
            Self::LeftEarly => "left_early",
            Self::LateAndLeftEarly => "late_and_left_early",
            Self::TooEarlyAndLeftEarly => "too_early_and_left_early",
            Self::LateAndTooEarly => "late_and_too_early",
            Self::LateTooEarlyAndLeftEarly => "late_too_early_and_left_early",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Violation {
    /// Every set flag is represented in the kind. Late and too-early only
    /// coincide with a negative early-arrival tolerance.
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        match (self.is_late, self.is_too_early, self.is_early) {
            (true, true, true) => ViolationKind::LateTooEarlyAndLeftEarly,
            (true, true, false) => ViolationKind::LateAndTooEarly,
            (true, false, true) => ViolationKind::LateAndLeftEarly,
            (true, false, false) => ViolationKind::Late,
            (false, true, true) => ViolationKind::TooEarlyAndLeftEarly,
            (false, true, false) => ViolationKind::TooEarly,
            (false, false, _) => ViolationKind::LeftEarly,
        }
    }
}

/// Compares a session with its grid slot.
///
/// Returns `None` when the session is within every tolerance.
#[must_use]
pub fn classify(session: &Session, config: &ComplianceConfig) -> Option<Violation> {
    let actual_start = session.actual_start();
    let actual_end = session.actual_end();
    let window = ShiftWindow::for_start(actual_start, config);

    let is_late = actual_start > window.expected_start + config.grace();
    let is_too_early = actual_start < window.expected_start - config.early_arrival_tolerance();
    let is_early = actual_end < window.expected_end - config.early_leave_tolerance();

    if !(is_late || is_too_early || is_early) {
        return None;
    }

    Some(Violation {
        agent_id: session.agent_id,
        expected_start: window.expected_start,
        actual_start,
        expected_end: window.expected_end,
        actual_end,
        is_late,
        is_too_early,
        is_early,
        session_open: session.is_open(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::{PresenceEvent, PresenceStatus};
    use chrono::TimeZone;

    fn utc(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, sec).unwrap()
    }

    fn presence(status: PresenceStatus, timestamp: DateTime<Utc>) -> PresenceEvent {
        PresenceEvent {
            agent_id: AgentId(9),
            status,
            timestamp,
            duration: None,
        }
    }

    fn session(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Session {
        Session {
            agent_id: AgentId(9),
            start: presence(PresenceStatus::Online, start),
            end: end.map(|ts| presence(PresenceStatus::Invisible, ts)),
        }
    }

    fn config() -> ComplianceConfig {
        ComplianceConfig::default()
    }

    #[test]
    fn on_time_full_shift_has_no_violation() {
        assert!(classify(&session(utc(11, 0, 30), Some(utc(13, 0, 0))), &config()).is_none());
    }

    #[test]
    fn start_exactly_at_grace_boundary_is_not_late() {
        assert!(classify(&session(utc(11, 1, 0), Some(utc(13, 0, 0))), &config()).is_none());
    }

    #[test]
    fn start_one_second_past_grace_is_late() {
        let violation =
            classify(&session(utc(11, 1, 1), Some(utc(13, 0, 0))), &config()).unwrap();
        assert!(violation.is_late);
        assert!(!violation.is_early);
        assert_eq!(violation.kind(), ViolationKind::Late);
    }

    #[test]
    fn late_and_left_early_are_both_flagged() {
        let violation =
            classify(&session(utc(11, 10, 0), Some(utc(12, 45, 0))), &config()).unwrap();
        assert!(violation.is_late);
        assert!(violation.is_early);
        assert!(!violation.is_too_early);
        assert_eq!(violation.kind(), ViolationKind::LateAndLeftEarly);
        assert_eq!(violation.expected_start, utc(11, 0, 0));
        assert_eq!(violation.expected_end, utc(13, 0, 0));
    }

    #[test]
    fn leaving_within_tolerance_is_not_early() {
        assert!(classify(&session(utc(11, 0, 0), Some(utc(12, 50, 0))), &config()).is_none());
    }

    #[test]
    fn even_hour_arrival_is_late_for_previous_slot() {
        // 12:50 maps to the 11:00 slot, so it is late for that slot rather
        // than early for 13:00.
        let violation =
            classify(&session(utc(12, 50, 0), Some(utc(15, 0, 0))), &config()).unwrap();
        assert!(violation.is_late);
        assert_eq!(violation.expected_start, utc(11, 0, 0));
    }

    #[test]
    fn negative_arrival_tolerance_allows_too_early_flag() {
        let config = ComplianceConfig {
            early_arrival_tolerance_minutes: -30,
            ..ComplianceConfig::default()
        };
        let violation =
            classify(&session(utc(11, 10, 0), Some(utc(13, 0, 0))), &config).unwrap();
        assert!(violation.is_too_early);
        assert!(violation.is_late);
        assert!(!violation.is_early);
        assert_eq!(violation.kind(), ViolationKind::LateAndTooEarly);
    }

    #[test]
    fn kind_keeps_every_flag() {
        let mut violation = classify(&session(utc(11, 0, 0), None), &config()).unwrap();
        violation.is_late = true;
        violation.is_too_early = true;
        assert_eq!(violation.kind(), ViolationKind::LateTooEarlyAndLeftEarly);
        assert_eq!(violation.kind().as_str(), "late_too_early_and_left_early");
    }

    #[test]
    fn open_session_is_scored_with_zero_duration() {
        let violation = classify(&session(utc(11, 0, 0), None), &config()).unwrap();
        assert!(violation.session_open);
        assert!(violation.is_early);
        assert_eq!(violation.actual_end, violation.actual_start);
        assert_eq!(violation.kind(), ViolationKind::LeftEarly);
    }

    #[test]
    fn tolerances_come_from_config() {
        let lenient = ComplianceConfig {
            grace_minutes: 15,
            early_leave_tolerance_minutes: 20,
            ..ComplianceConfig::default()
        };
        let session = session(utc(11, 10, 0), Some(utc(12, 45, 0)));
        assert!(classify(&session, &config()).is_some());
        assert!(classify(&session, &lenient).is_none());
    }
}
