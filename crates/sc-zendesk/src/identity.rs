//! Agent id to display label resolution.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use sc_core::AgentId;

/// Resolves agent ids to human-readable labels.
///
/// Resolution never fails: implementations fall back to [`fallback_label`].
pub trait IdentityResolver {
    fn resolve(&self, agent_id: AgentId) -> impl Future<Output = String> + Send;
}

/// Label used when an agent cannot be looked up.
#[must_use]
pub fn fallback_label(agent_id: AgentId) -> String {
    format!("Agent#{agent_id}")
}

/// Resolves each distinct agent once, one lookup at a time, in ascending id order.
pub async fn resolve_labels<R: IdentityResolver>(
    resolver: &R,
    agents: &[AgentId],
) -> BTreeMap<AgentId, String> {
    let distinct: BTreeSet<AgentId> = agents.iter().copied().collect();
    let total = distinct.len();
    let mut labels = BTreeMap::new();
    for agent_id in distinct {
        let label = resolver.resolve(agent_id).await;
        labels.insert(agent_id, label);
        tracing::info!(resolved = labels.len(), total, "resolved agent label");
    }
    labels
}
