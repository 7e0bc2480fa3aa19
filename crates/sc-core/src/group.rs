//! Partitioning the fetched event stream into per-agent timelines.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::presence::{AgentId, PresenceEvent, TimeRange};

/// Chronological presence events for one agent.
///
/// Events are sorted ascending by timestamp; events sharing a timestamp keep
/// the order in which they were fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AgentTimeline {
    events: Vec<PresenceEvent>,
}

impl AgentTimeline {
    /// Builds a timeline, sorting the events by timestamp.
    #[must_use]
    pub fn new(mut events: Vec<PresenceEvent>) -> Self {
        events.sort_by_key(|event| event.timestamp);
        Self { events }
    }

    #[must_use]
    pub fn events(&self) -> &[PresenceEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Groups events by agent, dropping anything outside `range`.
///
/// Agents with no event inside the range are absent from the result.
pub fn group_by_agent(
    events: &[PresenceEvent],
    range: &TimeRange,
) -> BTreeMap<AgentId, AgentTimeline> {
    let mut buckets: BTreeMap<AgentId, Vec<PresenceEvent>> = BTreeMap::new();
    let mut dropped = 0usize;

    for event in events {
        if !range.contains(event.timestamp) {
            dropped += 1;
            continue;
        }
        buckets.entry(event.agent_id).or_default().push(event.clone());
    }

    if dropped > 0 {
        tracing::debug!(dropped, "dropped events outside query range");
    }

    buckets
        .into_iter()
        .map(|(agent_id, events)| (agent_id, AgentTimeline::new(events)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::PresenceStatus;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, min, sec).unwrap()
    }

    fn event(agent: u64, status: &str, timestamp: DateTime<Utc>) -> PresenceEvent {
        PresenceEvent {
            agent_id: AgentId(agent),
            status: PresenceStatus::from(status),
            timestamp,
            duration: None,
        }
    }

    fn range() -> TimeRange {
        TimeRange::new(at(1, 0, 0), at(23, 0, 0)).unwrap()
    }

    #[test]
    fn drops_event_one_second_before_range_start() {
        let events = vec![
            event(7, "online", at(1, 0, 0) - Duration::seconds(1)),
            event(7, "invisible", at(2, 0, 0)),
        ];

        let grouped = group_by_agent(&events, &range());

        let timeline = &grouped[&AgentId(7)];
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.events()[0].status, PresenceStatus::Invisible);
    }

    #[test]
    fn keeps_events_exactly_on_range_bounds() {
        let events = vec![
            event(7, "online", at(1, 0, 0)),
            event(7, "invisible", at(23, 0, 0)),
        ];

        let grouped = group_by_agent(&events, &range());

        assert_eq!(grouped[&AgentId(7)].len(), 2);
    }

    #[test]
    fn agent_with_only_out_of_range_events_is_absent() {
        let events = vec![
            event(7, "online", at(0, 30, 0)),
            event(8, "online", at(3, 0, 0)),
        ];

        let grouped = group_by_agent(&events, &range());

        assert!(!grouped.contains_key(&AgentId(7)));
        assert!(grouped.contains_key(&AgentId(8)));
    }

    #[test]
    fn sorts_each_bucket_by_timestamp() {
        let events = vec![
            event(7, "invisible", at(5, 0, 0)),
            event(8, "online", at(2, 0, 0)),
            event(7, "online", at(3, 0, 0)),
            event(7, "away", at(4, 0, 0)),
        ];

        let grouped = group_by_agent(&events, &range());

        let statuses: Vec<_> = grouped[&AgentId(7)]
            .events()
            .iter()
            .map(|e| e.status.as_str().to_string())
            .collect();
        assert_eq!(statuses, vec!["online", "away", "invisible"]);
    }

    #[test]
    fn equal_timestamps_keep_arrival_order() {
        let events = vec![
            event(7, "invisible", at(5, 0, 0)),
            event(7, "online", at(5, 0, 0)),
        ];

        let grouped = group_by_agent(&events, &range());

        let timeline = grouped[&AgentId(7)].events();
        assert!(timeline[0].is_invisible());
        assert!(timeline[1].is_online());
    }
}
