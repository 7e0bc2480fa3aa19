//! Presence-status events from the agent activity timeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a query range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeRangeError {
    /// The range ends before it starts.
    #[error("range end {end} is before range start {start}")]
    Inverted {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Numeric identifier of a support agent on the helpdesk platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Presence status reported for an agent.
///
/// Statuses the analyzer does not care about are kept verbatim in `Other`
/// so that nothing is lost when dumping raw data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PresenceStatus {
    Online,
    Invisible,
    Offline,
    Away,
    Other(String),
}

impl PresenceStatus {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Online => "online",
            Self::Invisible => "invisible",
            Self::Offline => "offline",
            Self::Away => "away",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for PresenceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "online" => Self::Online,
            "invisible" => Self::Invisible,
            "offline" => Self::Offline,
            "away" => Self::Away,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PresenceStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PresenceStatus> for String {
    fn from(value: PresenceStatus) -> Self {
        match value {
            PresenceStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single presence transition for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub agent_id: AgentId,
    pub status: PresenceStatus,
    pub timestamp: DateTime<Utc>,
    /// Time spent in this status, in seconds, when the source reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl PresenceEvent {
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == PresenceStatus::Online
    }

    #[must_use]
    pub fn is_invisible(&self) -> bool {
        self.status == PresenceStatus::Invisible
    }
}

/// Inclusive query window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeRangeError> {
        if end < start {
            return Err(TimeRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Both bounds are inclusive.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_parses_known_and_preserves_unknown() {
        assert_eq!(PresenceStatus::from("online"), PresenceStatus::Online);
        assert_eq!(PresenceStatus::from("invisible"), PresenceStatus::Invisible);
        assert_eq!(
            PresenceStatus::from("on_break"),
            PresenceStatus::Other("on_break".to_string())
        );
    }

    #[test]
    fn status_serializes_as_plain_string() {
        let json = serde_json::to_string(&PresenceStatus::Other("busy".into())).unwrap();
        assert_eq!(json, r#""busy""#);
        let parsed: PresenceStatus = serde_json::from_str(r#""offline""#).unwrap();
        assert_eq!(parsed, PresenceStatus::Offline);
    }

    #[test]
    fn time_range_rejects_inverted_bounds() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
        assert!(matches!(
            TimeRange::new(start, end),
            Err(TimeRangeError::Inverted { .. })
        ));
    }

    #[test]
    fn time_range_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap();
        let range = TimeRange::new(start, end).unwrap();
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(start - chrono::Duration::seconds(1)));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
    }
}
