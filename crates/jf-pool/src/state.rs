use std::collections::{BTreeMap, BTreeSet};

use jf_core::{ArcId, ClientId, EpochMs, Job, JobId};
use jf_generator::GeneratedArc;
use serde::{Deserialize, Serialize};

/// One thing the pool can take in: a standalone job or a whole arc whose
/// first step is visible.
#[derive(Clone, Debug, PartialEq)]
pub enum PoolUnit {
    Single(Job),
    Arc(GeneratedArc),
}

impl PoolUnit {
    /// The job that becomes visible when the unit is admitted.
    pub fn visible_job(&self) -> Option<&Job> {
        match self {
            PoolUnit::Single(job) => Some(job),
            PoolUnit::Arc(arc) => arc.missions.first(),
        }
    }

    pub fn visible_job_mut(&mut self) -> Option<&mut Job> {
        match self {
            PoolUnit::Single(job) => Some(job),
            PoolUnit::Arc(arc) => arc.missions.first_mut(),
        }
    }
}

/// The pool as a plain value. Every operation takes it by value and hands
/// back the next state; the caller owns the only copy.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub missions: Vec<Job>,
    pub pending_arc_missions: BTreeMap<ArcId, Vec<Job>>,
    pub completed_missions: Vec<JobId>,
    #[serde(default)]
    pub failed_missions: Vec<JobId>,
    #[serde(default)]
    pub completed_arcs: Vec<ArcId>,
    pub active_client_ids: BTreeSet<ClientId>,
    pub last_refresh: Option<EpochMs>,
}

impl PoolState {
    pub fn find(&self, job_id: &JobId) -> Option<&Job> {
        self.missions.iter().find(|j| &j.job_id == job_id)
    }

    /// Entries that count toward pool size. An expired job kept around until
    /// its replacement shows up does not.
    pub fn live_missions(&self) -> impl Iterator<Item = &Job> {
        self.missions.iter().filter(|j| j.replacement_generated_at.is_none())
    }

    pub fn size(&self) -> usize {
        self.live_missions().count()
    }

    pub fn accessible_count(&self, reputation: i32) -> usize {
        self.live_missions().filter(|j| j.is_accessible(reputation)).count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_arc_missions.values().map(Vec::len).sum()
    }

    /// Already progressed or failed.
    pub fn is_finalized(&self, job_id: &JobId) -> bool {
        self.completed_missions.contains(job_id) || self.failed_missions.contains(job_id)
    }

    pub fn has_pending(&self, arc_id: &ArcId) -> bool {
        self.pending_arc_missions.get(arc_id).is_some_and(|p| !p.is_empty())
    }

    /// True when some visible or pending job still belongs to `client_id`.
    pub fn client_in_use(&self, client_id: &ClientId) -> bool {
        self.missions.iter().any(|j| &j.client_id == client_id)
            || self.pending_arc_missions.values().flatten().any(|j| &j.client_id == client_id)
    }

    /// Add a unit: reserve every client it touches, show its first job and
    /// park any arc continuation. Returns the visible job id.
    pub fn admit(mut self, unit: PoolUnit) -> (Self, Option<JobId>) {
        match unit {
            PoolUnit::Single(job) => {
                let id = job.job_id.clone();
                self.active_client_ids.insert(job.client_id.clone());
                self.missions.push(job);
                (self, Some(id))
            }
            PoolUnit::Arc(arc) => {
                let arc_id = arc.arc_id.clone();
                self.active_client_ids.extend(arc.client_ids());
                let Some((first, rest)) = arc.into_parts() else {
                    return (self, None);
                };
                let id = first.job_id.clone();
                self.missions.push(first);
                if !rest.is_empty() {
                    self.pending_arc_missions.insert(arc_id, rest);
                }
                (self, Some(id))
            }
        }
    }

    /// Release `client_id` unless another visible or pending job still uses it.
    pub fn release_client(mut self, client_id: &ClientId) -> Self {
        if !self.client_in_use(client_id) {
            self.active_client_ids.remove(client_id);
        }
        self
    }

    /// Drop an arc's hidden continuation and free the clients only it held.
    pub fn drop_pending_arc(mut self, arc_id: &ArcId) -> (Self, Vec<JobId>, Vec<ClientId>) {
        let dropped = self.pending_arc_missions.remove(arc_id).unwrap_or_default();
        let ids = dropped.iter().map(|j| j.job_id.clone()).collect();
        let candidates: BTreeSet<ClientId> = dropped.into_iter().map(|j| j.client_id).collect();
        let mut freed = Vec::new();
        for client in candidates {
            if !self.client_in_use(&client) && self.active_client_ids.remove(&client) {
                freed.push(client);
            }
        }
        (self, ids, freed)
    }

    pub(crate) fn take_mission(&mut self, job_id: &JobId) -> Option<Job> {
        let pos = self.missions.iter().position(|j| &j.job_id == job_id)?;
        Some(self.missions.remove(pos))
    }
}
