use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::PoolState;

/// Diagnostic counts over the live pool.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total: usize,
    pub accessible: usize,
    pub locked: usize,
    pub by_archetype: BTreeMap<String, usize>,
    pub by_difficulty: BTreeMap<String, usize>,
    pub timed: usize,
    pub untimed: usize,
    pub arc_steps: usize,
    pub pending_arcs: usize,
    pub pending_arc_missions: usize,
    pub awaiting_replacement: usize,
    pub active_clients: usize,
    pub completed: usize,
    pub failed: usize,
}

pub fn pool_stats(state: &PoolState, reputation: i32) -> PoolStats {
    let mut stats = PoolStats {
        pending_arcs: state.pending_arc_missions.values().filter(|p| !p.is_empty()).count(),
        pending_arc_missions: state.pending_count(),
        awaiting_replacement: state.missions.len() - state.size(),
        active_clients: state.active_client_ids.len(),
        completed: state.completed_missions.len(),
        failed: state.failed_missions.len(),
        ..Default::default()
    };

    for job in state.live_missions() {
        stats.total += 1;
        if job.is_accessible(reputation) {
            stats.accessible += 1;
        } else {
            stats.locked += 1;
        }
        *stats.by_archetype.entry(job.archetype.to_string()).or_default() += 1;
        *stats.by_difficulty.entry(job.difficulty.to_string()).or_default() += 1;
        if job.is_timed() {
            stats.timed += 1;
        } else {
            stats.untimed += 1;
        }
        if job.arc_step().is_some() {
            stats.arc_steps += 1;
        }
    }
    stats
}
