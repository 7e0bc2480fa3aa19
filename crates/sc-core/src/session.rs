//! Work session reconstruction from a per-agent presence timeline.
//!
//! # Algorithm Summary
//!
//! The scan is a two-state machine over the sorted timeline:
//!
//! 1. `Seeking`: skip forward to the next `online` event, which opens a session.
//! 2. `InSession`: look forward for the first `invisible` event that is a real
//!    sign-off, i.e. the agent does not come back `online` within the sign-off
//!    gap. Shorter `invisible` blips are flicker and stay inside the session.
//!
//! A session without a sign-off is emitted as open. Scanning then resumes one
//! event past the position right after the session start.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::group::AgentTimeline;
use crate::presence::{AgentId, PresenceEvent};

/// One continuous block of `online` presence for an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub agent_id: AgentId,
    /// The `online` event that opened the session.
    pub start: PresenceEvent,
    /// The `invisible` event that closed it, if any.
    pub end: Option<PresenceEvent>,
}

impl Session {
    #[must_use]
    pub const fn actual_start(&self) -> DateTime<Utc> {
        self.start.timestamp
    }

    /// Open sessions report their start as their end.
    #[must_use]
    pub fn actual_end(&self) -> DateTime<Utc> {
        self.end
            .as_ref()
            .map_or(self.start.timestamp, |end| end.timestamp)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Looking for the next `online` event.
    Seeking,
    /// A session opened at `start`; looking for its sign-off.
    InSession { start: usize },
}

/// Whether an `invisible` event at `invisible_at` ends a session.
///
/// `next_online_at` is the timestamp of the next `online` event after it, if
/// any. Without one the agent never came back, so the event always qualifies.
#[must_use]
pub fn is_sign_off(
    invisible_at: DateTime<Utc>,
    next_online_at: Option<DateTime<Utc>>,
    sign_off_gap: Duration,
) -> bool {
    next_online_at.is_none_or(|online_at| online_at - invisible_at > sign_off_gap)
}

/// For every index, the index of the first `online` event strictly after it.
fn next_online_indices(events: &[PresenceEvent]) -> Vec<Option<usize>> {
    let mut next = vec![None; events.len()];
    let mut upcoming = None;
    for (index, event) in events.iter().enumerate().rev() {
        next[index] = upcoming;
        if event.is_online() {
            upcoming = Some(index);
        }
    }
    next
}

/// Reconstructs sessions from one agent's timeline.
///
/// Sessions come out in non-decreasing start order.
pub fn reconstruct_sessions(timeline: &AgentTimeline, sign_off_gap: Duration) -> Vec<Session> {
    let events = timeline.events();
    let next_online = next_online_indices(events);
    let qualifies = |index: usize| {
        let event = &events[index];
        event.is_invisible()
            && is_sign_off(
                event.timestamp,
                next_online[index].map(|online| events[online].timestamp),
                sign_off_gap,
            )
    };

    let mut sessions = Vec::new();
    let mut state = ScanState::Seeking;
    let mut cursor = 0;

    loop {
        match state {
            ScanState::Seeking => {
                let Some(start) = (cursor..events.len()).find(|&i| events[i].is_online()) else {
                    break;
                };
                state = ScanState::InSession { start };
                cursor = start + 1;
            }
            ScanState::InSession { start } => {
                let end = (cursor..events.len()).find(|&j| qualifies(j));
                sessions.push(Session {
                    agent_id: events[start].agent_id,
                    start: events[start].clone(),
                    end: end.map(|j| events[j].clone()),
                });
                cursor = end.map_or(cursor + 1, |j| j + 1);
                state = ScanState::Seeking;
            }
        }
    }

    let open = sessions.iter().filter(|s| s.is_open()).count();
    if open > 0 {
        tracing::debug!(open, total = sessions.len(), "timeline has open sessions");
    }

    sessions
}
