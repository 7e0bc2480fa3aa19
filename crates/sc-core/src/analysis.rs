//! Per-agent analysis pipeline: group, reconstruct, classify, merge.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::group::{AgentTimeline, group_by_agent};
use crate::presence::{AgentId, PresenceEvent, TimeRange};
use crate::session::{Session, reconstruct_sessions};
use crate::shift::ComplianceConfig;
use crate::violation::{Violation, classify};

/// Result of one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    /// In-range events per agent.
    pub timelines: BTreeMap<AgentId, AgentTimeline>,
    /// Reconstructed sessions per agent, in start order.
    pub sessions: BTreeMap<AgentId, Vec<Session>>,
    /// Violations sorted by agent, then actual start.
    pub violations: Vec<Violation>,
}

impl Analysis {
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.values().map(Vec::len).sum()
    }

    /// Distinct agents with at least one violation, ascending.
    #[must_use]
    pub fn violating_agents(&self) -> Vec<AgentId> {
        let mut agents: Vec<AgentId> = self.violations.iter().map(|v| v.agent_id).collect();
        agents.dedup();
        agents
    }
}

/// Runs the full analysis over an already-fetched event set.
///
/// Agents are processed in parallel; the output does not depend on scheduling.
pub fn analyze(events: &[PresenceEvent], range: &TimeRange, config: &ComplianceConfig) -> Analysis {
    let timelines = group_by_agent(events, range);
    let gap = config.sign_off_gap();

    let per_agent: Vec<(AgentId, Vec<Session>, Vec<Violation>)> = timelines
        .par_iter()
        .map(|(agent_id, timeline)| {
            let sessions = reconstruct_sessions(timeline, gap);
            let violations = sessions
                .iter()
                .filter_map(|session| classify(session, config))
                .collect();
            (*agent_id, sessions, violations)
        })
        .collect();

    let mut sessions = BTreeMap::new();
    let mut violations = Vec::new();
    for (agent_id, agent_sessions, agent_violations) in per_agent {
        sessions.insert(agent_id, agent_sessions);
        violations.extend(agent_violations);
    }
    violations.sort_by_key(|v| (v.agent_id, v.actual_start));

    tracing::info!(
        agents = timelines.len(),
        sessions = sessions.values().map(Vec::len).sum::<usize>(),
        violations = violations.len(),
        "analysis complete"
    );

    Analysis {
        timelines,
        sessions,
        violations,
    }
}
