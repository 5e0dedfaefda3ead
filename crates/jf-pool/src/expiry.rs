use jf_core::{ArcId, ClientId, EpochMs, Job, JobId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::manager::PoolManager;
use crate::state::PoolState;

/// Notifications for whoever delivers pool news to the player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PoolEvent {
    MissionExpired { job_id: JobId, client_id: ClientId },
    ReplacementScheduled { expired: JobId, replacement: JobId, visible_at: EpochMs },
    ReplacementRevealed { expired: JobId, replacement: JobId },
    ArcCancelled { arc_id: ArcId, dropped: Vec<JobId> },
}

/// Jobs the player can see at `now`. Replacements waiting out their delay
/// are left out.
pub fn visible_missions(state: &PoolState, now: EpochMs) -> Vec<&Job> {
    state.missions.iter().filter(|j| j.is_visible(now)).collect()
}

impl<'a> PoolManager<'a> {
    /// Two passes over the pool at `now`.
    ///
    /// First, expired entries whose replacement is now visible (or gone) are
    /// removed and the replacement's back-link is cleared. Then every newly
    /// expired entry, other than the active job, is either kept and marked
    /// while a hidden replacement is generated, or removed when the pool has
    /// no room or no client to spare. Expired arc steps always lose their
    /// hidden continuation.
    pub fn process_expired_missions<R: Rng>(
        &self,
        state: PoolState,
        reputation: i32,
        now: EpochMs,
        active_job: Option<&JobId>,
        rng: &mut R,
    ) -> (PoolState, Vec<PoolEvent>) {
        let mut events = Vec::new();
        let state = self.reveal_replacements(state, now, &mut events);
        let state = self.expire_due(state, reputation, now, active_job, rng, &mut events);
        (state, events)
    }

    fn reveal_replacements(&self, mut state: PoolState, now: EpochMs, events: &mut Vec<PoolEvent>) -> PoolState {
        let waiting: Vec<JobId> = state
            .missions
            .iter()
            .filter(|j| j.replacement_generated_at.is_some())
            .map(|j| j.job_id.clone())
            .collect();

        for expired_id in waiting {
            let replacement = state
                .missions
                .iter()
                .position(|j| j.replaces_expired_mission_id.as_ref() == Some(&expired_id));
            let replacement_id = match replacement {
                Some(pos) if !state.missions[pos].is_visible(now) => continue,
                Some(pos) => {
                    let job = &mut state.missions[pos];
                    job.replaces_expired_mission_id = None;
                    job.visible_at = None;
                    Some(job.job_id.clone())
                }
                // Replacement already accepted or removed.
                None => None,
            };

            if let Some(old) = state.take_mission(&expired_id) {
                state = state.release_client(&old.client_id);
            }
            if let Some(replacement) = replacement_id {
                debug!(expired = %expired_id, replacement = %replacement, "replacement revealed");
                events.push(PoolEvent::ReplacementRevealed { expired: expired_id, replacement });
            }
        }
        state
    }

    fn expire_due<R: Rng>(
        &self,
        mut state: PoolState,
        reputation: i32,
        now: EpochMs,
        active_job: Option<&JobId>,
        rng: &mut R,
        events: &mut Vec<PoolEvent>,
    ) -> PoolState {
        let due: Vec<JobId> = state
            .missions
            .iter()
            .filter(|j| {
                j.is_visible(now)
                    && j.is_expired(now)
                    && j.replacement_generated_at.is_none()
                    && Some(&j.job_id) != active_job
            })
            .map(|j| j.job_id.clone())
            .collect();

        let config = self.config();
        for id in due {
            let Some(job) = state.find(&id).cloned() else { continue };
            events.push(PoolEvent::MissionExpired { job_id: id.clone(), client_id: job.client_id.clone() });

            if state.size() >= config.max {
                let (next, cancelled) = self.remove_expired(state, &id);
                state = next;
                if let Some((arc_id, dropped)) = cancelled {
                    events.push(PoolEvent::ArcCancelled { arc_id, dropped });
                }
                continue;
            }

            if let Some(arc_id) = job.arc_id() {
                let (next, dropped, _) = state.drop_pending_arc(arc_id);
                state = next;
                if !dropped.is_empty() {
                    info!(arc = %arc_id, dropped = dropped.len(), "arc cancelled by expiry");
                    events.push(PoolEvent::ArcCancelled { arc_id: arc_id.clone(), dropped });
                }
            }

            // Keep the accessible floor when an accessible job is the one leaving.
            let accessible_after = state
                .accessible_count(reputation)
                .saturating_sub(usize::from(job.is_accessible(reputation)));
            let force_accessible = accessible_after < config.min_accessible;

            let Some(mut unit) = self.generate_pool_mission(&state, reputation, now, rng, force_accessible) else {
                debug!(job = %id, "no replacement available, removing expired mission");
                state = self.remove_expired(state, &id).0;
                continue;
            };
            let visible_at = now + config.regeneration_delay_ms;
            if let Some(first) = unit.visible_job_mut() {
                first.visible_at = Some(visible_at);
                first.replaces_expired_mission_id = Some(id.clone());
            }

            let (next, replacement) = state.admit(unit);
            state = next;
            if let Some(expired) = state.missions.iter_mut().find(|j| j.job_id == id) {
                expired.replacement_generated_at = Some(now);
            }
            if let Some(replacement) = replacement {
                info!(expired = %id, replacement = %replacement, visible_at, "replacement scheduled");
                events.push(PoolEvent::ReplacementScheduled { expired: id, replacement, visible_at });
            }
        }
        state
    }
}
