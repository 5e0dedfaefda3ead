use std::collections::BTreeSet;

use jf_arcs::StorylineCatalog;
use jf_clients::ClientDirectory;
use jf_core::{ArcId, Client, ClientId, EpochMs, Job, JobId, JobKind};
use jf_generator::{add_expiration_to_mission, GenerateOptions, GeneratedArc, MissionGenerator};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::state::{PoolState, PoolUnit};

/// What completing a job did to its arc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum ArcProgress {
    NotArc,
    Revealed { job_id: JobId },
    ArcCompleted { arc_id: ArcId },
    /// The arc's continuation was already gone, e.g. cancelled by an expiry.
    Orphaned { arc_id: ArcId },
    AlreadyProcessed,
}

/// What failing a job did to its arc.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum ArcFailure {
    NotArc,
    Cancelled { arc_id: ArcId, dropped: Vec<JobId>, freed_clients: Vec<ClientId> },
    AlreadyProcessed,
}

/// Lifecycle operations over [`PoolState`]. Holds only borrowed catalogs and
/// config; the state itself is always passed in and returned.
pub struct PoolManager<'a> {
    generator: MissionGenerator<'a>,
    catalog: &'a StorylineCatalog,
    config: PoolConfig,
}

impl<'a> PoolManager<'a> {
    pub fn new(directory: &'a dyn ClientDirectory, catalog: &'a StorylineCatalog, config: PoolConfig) -> Self {
        Self { generator: MissionGenerator::new(directory), catalog, config }
    }

    pub fn with_generator(generator: MissionGenerator<'a>, catalog: &'a StorylineCatalog, config: PoolConfig) -> Self {
        Self { generator, catalog, config }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn generator(&self) -> &MissionGenerator<'a> {
        &self.generator
    }

    fn directory(&self) -> &'a dyn ClientDirectory {
        self.generator.directory()
    }

    /// Fresh pool: `min_accessible` accessible entries first, then fill to a
    /// random size in `[min, max]`. Stops at the first generation failure.
    pub fn initialize_pool<R: Rng>(&self, reputation: i32, now: EpochMs, rng: &mut R) -> PoolState {
        let mut state = PoolState::default();

        while state.accessible_count(reputation) < self.config.min_accessible {
            match self.generate_pool_mission(&state, reputation, now, rng, true) {
                Some(unit) => state = state.admit(unit).0,
                None => {
                    warn!(reputation, "no accessible client left while seeding pool");
                    break;
                }
            }
        }

        let target = rng.gen_range(self.config.min..=self.config.max);
        while state.size() < target {
            match self.generate_pool_mission(&state, reputation, now, rng, false) {
                Some(unit) => state = state.admit(unit).0,
                None => {
                    warn!(size = state.size(), target, "client directory exhausted, pool left short");
                    break;
                }
            }
        }

        state.last_refresh = Some(now);
        info!(
            size = state.size(),
            accessible = state.accessible_count(reputation),
            pending = state.pending_count(),
            "pool initialized"
        );
        state
    }

    /// Below `min`, or short of accessible entries.
    pub fn should_refresh_pool(&self, state: &PoolState, reputation: i32) -> bool {
        state.size() < self.config.min || state.accessible_count(reputation) < self.config.min_accessible
    }

    /// Drop expired entries (the active job excepted), cancel the arcs they
    /// belonged to, then backfill: accessible first, then up to `min`.
    pub fn refresh_pool<R: Rng>(
        &self,
        state: PoolState,
        reputation: i32,
        now: EpochMs,
        active_job: Option<&JobId>,
        rng: &mut R,
    ) -> PoolState {
        let expired: Vec<JobId> = state
            .missions
            .iter()
            .filter(|j| j.is_expired(now) && j.replacement_generated_at.is_none() && Some(&j.job_id) != active_job)
            .map(|j| j.job_id.clone())
            .collect();

        let mut state = state;
        for id in &expired {
            state = self.remove_expired(state, id).0;
        }

        while state.accessible_count(reputation) < self.config.min_accessible && state.size() < self.config.max {
            match self.generate_pool_mission(&state, reputation, now, rng, true) {
                Some(unit) => state = state.admit(unit).0,
                None => break,
            }
        }
        while state.size() < self.config.min {
            match self.generate_pool_mission(&state, reputation, now, rng, false) {
                Some(unit) => state = state.admit(unit).0,
                None => break,
            }
        }

        state.last_refresh = Some(now);
        debug!(
            expired = expired.len(),
            size = state.size(),
            accessible = state.accessible_count(reputation),
            "pool refreshed"
        );
        state
    }

    /// Remove an expired entry outright. An arc step takes its hidden
    /// continuation with it.
    pub(crate) fn remove_expired(&self, mut state: PoolState, job_id: &JobId) -> (PoolState, Option<(ArcId, Vec<JobId>)>) {
        let Some(job) = state.take_mission(job_id) else {
            return (state, None);
        };
        info!(job = %job.job_id, client = %job.client_id, "mission expired and removed");
        let mut cancelled = None;
        if let Some(arc_id) = job.arc_id() {
            let (next, dropped, _) = state.drop_pending_arc(arc_id);
            state = next;
            if !dropped.is_empty() {
                info!(arc = %arc_id, dropped = dropped.len(), "arc cancelled by expiry");
                cancelled = Some((arc_id.clone(), dropped));
            }
        }
        (state.release_client(&job.client_id), cancelled)
    }

    /// Pick a client and build one pool unit for it. With `force_accessible`
    /// only accessible clients qualify; otherwise accessible ones win
    /// `accessible_bias` of the time and locked ones are the fallback.
    pub fn generate_pool_mission<R: Rng>(
        &self,
        state: &PoolState,
        reputation: i32,
        now: EpochMs,
        rng: &mut R,
        force_accessible: bool,
    ) -> Option<PoolUnit> {
        let exclude = &state.active_client_ids;
        let client = self.pick_client(reputation, exclude, force_accessible, rng)?;

        let arc = if rng.gen_bool(self.config.arc_chance.clamp(0.0, 1.0)) {
            self.try_arc(&client, exclude, now, rng).filter(|arc| self.arc_fits(state, reputation, arc))
        } else {
            None
        };
        let mut unit = match arc {
            Some(arc) => PoolUnit::Arc(arc),
            None => {
                let options = GenerateOptions { timed_chance: self.generator.timed_chance(), ..Default::default() };
                PoolUnit::Single(self.generator.generate_mission(&client.id, &options, now, rng)?)
            }
        };

        if let Some(job) = unit.visible_job_mut() {
            job.expires_at = Some(now + self.config.expiration.sample_ms(rng));
        }
        Some(unit)
    }

    fn pick_client<R: Rng>(
        &self,
        reputation: i32,
        exclude: &BTreeSet<ClientId>,
        force_accessible: bool,
        rng: &mut R,
    ) -> Option<Client> {
        let directory = self.directory();
        let accessible_first = force_accessible || rng.gen_bool(self.config.accessible_bias.clamp(0.0, 1.0));
        let locked = |rng: &mut R| -> Option<Client> {
            let candidates: Vec<Client> = directory
                .locked_clients(reputation)
                .into_iter()
                .filter(|c| !exclude.contains(&c.id))
                .collect();
            candidates.choose(rng).cloned()
        };

        if accessible_first {
            let picked = directory.random_accessible_client(reputation, exclude, &mut *rng);
            if force_accessible {
                return picked;
            }
            picked.or_else(|| locked(rng))
        } else {
            locked(rng).or_else(|| directory.random_accessible_client(reputation, exclude, &mut *rng))
        }
    }

    /// Whole arc opened by `client`. The remaining candidates are the other
    /// free clients, accessible ones first.
    fn try_arc<R: Rng>(
        &self,
        client: &Client,
        exclude: &BTreeSet<ClientId>,
        now: EpochMs,
        rng: &mut R,
    ) -> Option<GeneratedArc> {
        let storyline = self.catalog.random_storyline(rng)?;
        let mut others: Vec<Client> = self
            .directory()
            .all_clients()
            .into_iter()
            .filter(|c| c.id != client.id && !exclude.contains(&c.id))
            .collect();
        others.shuffle(rng);

        let mut clients = Vec::with_capacity(others.len() + 1);
        clients.push(client.clone());
        clients.extend(others);

        let arc = self.generator.generate_mission_arc(storyline, &clients, exclude, now, rng);
        if arc.is_none() {
            debug!(storyline = %storyline.id, client = %client.id, "arc could not be staffed, falling back to a single job");
        }
        arc
    }

    /// An arc fills one slot but reserves every client it will use. Admit it
    /// only while the clients left free can still bring the pool up to `min`
    /// and `min_accessible`.
    fn arc_fits(&self, state: &PoolState, reputation: i32, arc: &GeneratedArc) -> bool {
        let reserved = arc.client_ids();
        let free: Vec<Client> = self
            .directory()
            .all_clients()
            .into_iter()
            .filter(|c| !state.active_client_ids.contains(&c.id) && !reserved.contains(&c.id))
            .collect();
        let free_accessible = free.iter().filter(|c| c.is_accessible(reputation)).count();

        let opens_accessible = arc.missions.first().is_some_and(|j| j.is_accessible(reputation));
        let size_short = self.config.min.saturating_sub(state.size() + 1);
        let accessible_short = self
            .config
            .min_accessible
            .saturating_sub(state.accessible_count(reputation) + usize::from(opens_accessible));

        let fits = free.len() >= size_short && free_accessible >= accessible_short;
        if !fits {
            debug!(
                arc = %arc.arc_id,
                reserved = reserved.len(),
                free = free.len(),
                free_accessible,
                "arc would starve the pool, falling back to a single job"
            );
        }
        fits
    }

    /// Take an accepted job out of the pool. Its client stays reserved while
    /// the job's arc still has hidden steps.
    pub fn remove_mission_from_pool(&self, mut state: PoolState, job_id: &JobId) -> PoolState {
        let Some(job) = state.take_mission(job_id) else {
            debug!(job = %job_id, "remove requested for a job not in the pool");
            return state;
        };
        let arc_continues = job.arc_id().is_some_and(|a| state.has_pending(a));
        if !arc_continues {
            state = state.release_client(&job.client_id);
        }
        debug!(job = %job.job_id, arc_continues, "mission removed from pool");
        state
    }

    /// Record a completed job and, for an arc step, reveal the next step with
    /// a fresh expiry or close the arc when nothing is left.
    pub fn handle_arc_progression<R: Rng>(
        &self,
        mut state: PoolState,
        completed: &Job,
        now: EpochMs,
        rng: &mut R,
    ) -> (PoolState, ArcProgress) {
        if state.is_finalized(&completed.job_id) {
            warn!(job = %completed.job_id, "completion already processed");
            return (state, ArcProgress::AlreadyProcessed);
        }
        state.completed_missions.push(completed.job_id.clone());
        state.take_mission(&completed.job_id);

        let step = match &completed.kind {
            JobKind::Single => return (state.release_client(&completed.client_id), ArcProgress::NotArc),
            JobKind::ArcStep(step) => step,
        };
        let arc_id = step.arc_id.clone();

        let mut rest = state.pending_arc_missions.remove(&arc_id).unwrap_or_default();
        if rest.is_empty() {
            let state = state.release_client(&completed.client_id);
            if step.is_last() {
                let mut state = state;
                state.completed_arcs.push(arc_id.clone());
                info!(arc = %arc_id, name = %step.arc_name, "arc completed");
                return (state, ArcProgress::ArcCompleted { arc_id });
            }
            warn!(arc = %arc_id, sequence = step.sequence, "arc step completed but its continuation is gone");
            return (state, ArcProgress::Orphaned { arc_id });
        }

        let next = add_expiration_to_mission(rest.remove(0), now, &self.config.expiration, rng);
        let revealed = next.job_id.clone();
        if !rest.is_empty() {
            state.pending_arc_missions.insert(arc_id.clone(), rest);
        }
        state.missions.push(next);
        let state = state.release_client(&completed.client_id);
        info!(arc = %arc_id, job = %revealed, "next arc step revealed");
        (state, ArcProgress::Revealed { job_id: revealed })
    }

    /// Record a failed job. An arc step cancels the whole arc: every hidden
    /// continuation goes and every client it held is freed.
    pub fn handle_arc_failure(&self, mut state: PoolState, failed: &Job) -> (PoolState, ArcFailure) {
        if state.is_finalized(&failed.job_id) {
            warn!(job = %failed.job_id, "failure already processed");
            return (state, ArcFailure::AlreadyProcessed);
        }
        state.failed_missions.push(failed.job_id.clone());
        state.take_mission(&failed.job_id);

        let Some(arc_id) = failed.arc_id().cloned() else {
            return (state.release_client(&failed.client_id), ArcFailure::NotArc);
        };

        let (mut state, dropped, mut freed_clients) = state.drop_pending_arc(&arc_id);
        if !state.client_in_use(&failed.client_id) && state.active_client_ids.remove(&failed.client_id) {
            freed_clients.push(failed.client_id.clone());
        }
        info!(arc = %arc_id, dropped = dropped.len(), freed = freed_clients.len(), "arc cancelled after failure");
        (state, ArcFailure::Cancelled { arc_id, dropped, freed_clients })
    }
}

#[cfg(test)]
mod tests {
    use jf_clients::InMemoryDirectory;
    use jf_core::{seeded_rng, MINUTE_MS};

    use super::*;

    fn arc_heavy() -> PoolConfig {
        PoolConfig { arc_chance: 1.0, ..Default::default() }
    }

    #[test]
    fn forced_accessible_never_picks_a_locked_client() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, PoolConfig::default());
        let mut rng = seeded_rng(10);
        for _ in 0..50 {
            let unit = manager.generate_pool_mission(&PoolState::default(), 1, 0, &mut rng, true).unwrap();
            let job = unit.visible_job().unwrap();
            assert!(job.is_accessible(1));
            assert!(job.expires_at.is_some_and(|at| at >= 15 * MINUTE_MS && at <= 60 * MINUTE_MS));
        }
    }

    #[test]
    fn excluded_clients_are_skipped() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, PoolConfig { arc_chance: 0.0, ..Default::default() });
        let mut rng = seeded_rng(4);
        let mut state = PoolState::default();
        state.active_client_ids = dir.all_clients().into_iter().skip(1).map(|c| c.id).collect();
        let only = dir.all_clients()[0].id.clone();
        let unit = manager.generate_pool_mission(&state, 10, 0, &mut rng, false).unwrap();
        assert_eq!(unit.visible_job().unwrap().client_id, only);

        state.active_client_ids.insert(only);
        assert!(manager.generate_pool_mission(&state, 10, 0, &mut rng, false).is_none());
    }

    #[test]
    fn progression_reveals_steps_in_order_then_completes() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, arc_heavy());
        let mut rng = seeded_rng(21);

        let unit = manager.generate_pool_mission(&PoolState::default(), 10, 0, &mut rng, true).unwrap();
        let PoolUnit::Arc(arc) = &unit else { panic!("expected an arc") };
        let total = arc.total_missions as usize;
        let arc_id = arc.arc_id.clone();
        let (mut state, first) = PoolState::default().admit(unit);
        let mut current = first.unwrap();

        for k in 1..total {
            let job = state.find(&current).cloned().unwrap();
            state = manager.remove_mission_from_pool(state, &current);
            assert!(state.active_client_ids.contains(&job.client_id));
            let now = k as EpochMs * MINUTE_MS;
            let (next, progress) = manager.handle_arc_progression(state, &job, now, &mut rng);
            state = next;
            let job_id = match progress {
                ArcProgress::Revealed { job_id } => job_id,
                other => panic!("expected reveal, got {other:?}"),
            };
            let revealed = state.find(&job_id).unwrap();
            assert_eq!(revealed.arc_step().unwrap().sequence as usize, k + 1);
            assert!(revealed.expires_at.unwrap() > now);
            assert_eq!(state.missions.len(), 1);
            current = job_id;
        }

        let last = state.find(&current).cloned().unwrap();
        state = manager.remove_mission_from_pool(state, &current);
        let (state, progress) = manager.handle_arc_progression(state, &last, 10 * MINUTE_MS, &mut rng);
        assert_eq!(progress, ArcProgress::ArcCompleted { arc_id: arc_id.clone() });
        assert!(!state.pending_arc_missions.contains_key(&arc_id));
        assert!(state.active_client_ids.is_empty());
        assert_eq!(state.completed_arcs, vec![arc_id]);
    }

    #[test]
    fn single_completion_only_records() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, PoolConfig { arc_chance: 0.0, ..Default::default() });
        let mut rng = seeded_rng(8);
        let unit = manager.generate_pool_mission(&PoolState::default(), 3, 0, &mut rng, true).unwrap();
        let job = unit.visible_job().cloned().unwrap();
        let (state, _) = PoolState::default().admit(unit);
        let state = manager.remove_mission_from_pool(state, &job.job_id);
        assert!(state.active_client_ids.is_empty());

        let (state, progress) = manager.handle_arc_progression(state, &job, 0, &mut rng);
        assert_eq!(progress, ArcProgress::NotArc);
        assert_eq!(state.completed_missions, vec![job.job_id.clone()]);

        let (_, again) = manager.handle_arc_progression(state, &job, 0, &mut rng);
        assert_eq!(again, ArcProgress::AlreadyProcessed);
    }

    #[test]
    fn failure_cancels_the_arc_and_spares_the_rest() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, arc_heavy());
        let mut rng = seeded_rng(33);

        let arc_unit = manager.generate_pool_mission(&PoolState::default(), 10, 0, &mut rng, true).unwrap();
        let PoolUnit::Arc(arc) = &arc_unit else { panic!("expected an arc") };
        let arc_id = arc.arc_id.clone();
        let arc_clients = arc.client_ids();
        let total = arc.total_missions as usize;
        let (state, first) = PoolState::default().admit(arc_unit);

        let single_manager = PoolManager::new(&dir, &catalog, PoolConfig { arc_chance: 0.0, ..Default::default() });
        let other = single_manager.generate_pool_mission(&state, 10, 0, &mut rng, true).unwrap();
        let other_job = other.visible_job().cloned().unwrap();
        let (state, _) = state.admit(other);

        let failed = state.find(&first.unwrap()).cloned().unwrap();
        let state = manager.remove_mission_from_pool(state, &failed.job_id);
        let (state, outcome) = manager.handle_arc_failure(state, &failed);

        let ArcFailure::Cancelled { arc_id: cancelled, dropped, freed_clients } = outcome else {
            panic!("expected cancellation")
        };
        assert_eq!(cancelled, arc_id);
        assert_eq!(dropped.len() + 1, total);
        assert_eq!(freed_clients.iter().cloned().collect::<BTreeSet<_>>(), arc_clients);
        assert!(!state.pending_arc_missions.contains_key(&arc_id));
        assert_eq!(state.missions, vec![other_job.clone()]);
        assert_eq!(state.active_client_ids, BTreeSet::from([other_job.client_id]));

        let (_, again) = manager.handle_arc_failure(state, &failed);
        assert_eq!(again, ArcFailure::AlreadyProcessed);
    }

    #[test]
    fn failing_a_later_step_cancels_what_is_left() {
        let dir = InMemoryDirectory::builtin();
        let catalog = StorylineCatalog::builtin();
        let manager = PoolManager::new(&dir, &catalog, PoolConfig { arc_chance: 0.0, ..Default::default() });
        let generator = MissionGenerator::new(&dir);
        let mut rng = seeded_rng(52);

        let clients: Vec<Client> = ["client-cobalt-logic", "client-helix-dynamics", "client-civic-records"]
            .iter()
            .map(|id| dir.client_by_id(&ClientId::from_str(*id)).unwrap())
            .collect();
        let arc = generator
            .generate_mission_arc(catalog.get("production-line").unwrap(), &clients, &BTreeSet::new(), 0, &mut rng)
            .unwrap();
        assert_eq!(arc.total_missions, 3);
        let arc_id = arc.arc_id.clone();
        let step_clients: Vec<ClientId> = arc.missions.iter().map(|j| j.client_id.clone()).collect();
        assert_eq!(step_clients.iter().collect::<BTreeSet<_>>().len(), 3);
        let third = arc.missions[2].job_id.clone();
        let (state, first) = PoolState::default().admit(PoolUnit::Arc(arc));

        let other = manager.generate_pool_mission(&state, 10, 0, &mut rng, true).unwrap();
        let other_job = other.visible_job().cloned().unwrap();
        let (state, _) = state.admit(other);

        let step_one = state.find(&first.unwrap()).cloned().unwrap();
        let state = manager.remove_mission_from_pool(state, &step_one.job_id);
        let (state, progress) = manager.handle_arc_progression(state, &step_one, MINUTE_MS, &mut rng);
        let ArcProgress::Revealed { job_id: second } = progress else {
            panic!("expected step 2 to be revealed, got {progress:?}")
        };
        let step_two = state.find(&second).cloned().unwrap();
        assert_eq!(step_two.arc_step().unwrap().sequence, 2);

        let state = manager.remove_mission_from_pool(state, &second);
        let (state, outcome) = manager.handle_arc_failure(state, &step_two);
        let ArcFailure::Cancelled { arc_id: cancelled, dropped, freed_clients } = outcome else {
            panic!("expected cancellation")
        };
        assert_eq!(cancelled, arc_id);
        assert_eq!(dropped, vec![third.clone()]);
        assert_eq!(
            freed_clients.into_iter().collect::<BTreeSet<_>>(),
            BTreeSet::from([step_clients[1].clone(), step_clients[2].clone()])
        );
        assert!(state.find(&third).is_none());
        assert!(!state.pending_arc_missions.contains_key(&arc_id));
        assert_eq!(state.missions, vec![other_job.clone()]);
        assert_eq!(state.active_client_ids, BTreeSet::from([other_job.client_id]));
        assert_eq!(state.completed_missions, vec![step_one.job_id]);
        assert_eq!(state.failed_missions, vec![second]);
    }
}
