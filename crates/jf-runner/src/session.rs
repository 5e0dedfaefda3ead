use std::collections::BTreeSet;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jf_arcs::StorylineCatalog;
use jf_clients::ClientDirectory;
use jf_core::{
    minutes_to_ms, seeded_rng, Archetype, DelayedMessage, Difficulty, EpochMs, FailureReason, GameRng, Job, JobId,
};
use jf_generator::MissionGenerator;
use jf_pool::{
    pool_stats, visible_missions, ArcFailure, ArcProgress, PoolEvent, PoolManager, PoolState, PoolStats,
};

use crate::Config;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub job_id: JobId,
    pub credits: i64,
    pub reputation: i32,
    pub progress: ArcProgress,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    pub job_id: JobId,
    pub reason: FailureReason,
    pub credits: i64,
    pub reputation: i32,
    pub arc: ArcFailure,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub now: EpochMs,
    pub events: Vec<PoolEvent>,
    pub deadline_failure: Option<Failure>,
}

/// One row of the visible pool.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub job_id: JobId,
    pub title: String,
    pub client_name: String,
    pub archetype: Archetype,
    pub difficulty: Difficulty,
    pub payout: i64,
    pub time_limit_minutes: Option<u32>,
    pub expires_at: Option<EpochMs>,
    pub accessible: bool,
    pub arc: Option<String>,
}

impl JobSummary {
    fn new(job: &Job, reputation: i32) -> Self {
        Self {
            job_id: job.job_id.clone(),
            title: job.title.clone(),
            client_name: job.client_name.clone(),
            archetype: job.archetype,
            difficulty: job.difficulty,
            payout: job.base_payout,
            time_limit_minutes: job.time_limit_minutes,
            expires_at: job.expires_at,
            accessible: job.is_accessible(reputation),
            arc: job.arc_step().map(|s| format!("{} {}/{}", s.arc_name, s.sequence, s.total)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub now: EpochMs,
    pub reputation: i32,
    pub credits: i64,
    pub active_job: Option<JobId>,
    pub visible: Vec<JobSummary>,
    pub stats: PoolStats,
}

#[derive(Clone, Debug)]
struct ActiveJob {
    job: Job,
    accepted_at: EpochMs,
}

/// The imperative shell around the pool: owns the state value, the simulated
/// clock, the RNG and the player's numbers, and feeds them to the manager.
pub struct Session<'a> {
    manager: PoolManager<'a>,
    state: PoolState,
    rng: GameRng,
    now: EpochMs,
    reputation: i32,
    credits: i64,
    active: Option<ActiveJob>,
    finalized: BTreeSet<JobId>,
    mail: Vec<DelayedMessage>,
}

impl<'a> Session<'a> {
    pub fn open(cfg: &Config, directory: &'a dyn ClientDirectory, catalog: &'a StorylineCatalog) -> Result<Self> {
        cfg.pool.validate().context("invalid [pool] section")?;
        let generator = MissionGenerator::new(directory).with_timed_chance(cfg.engine.timed_chance);
        let manager = PoolManager::with_generator(generator, catalog, cfg.pool.clone());
        let mut rng = seeded_rng(cfg.engine.seed);
        let state = manager.initialize_pool(cfg.engine.reputation, 0, &mut rng);
        info!(seed = cfg.engine.seed, size = state.size(), "session opened");
        Ok(Self {
            manager,
            state,
            rng,
            now: 0,
            reputation: cfg.engine.reputation,
            credits: 0,
            active: None,
            finalized: BTreeSet::new(),
            mail: Vec::new(),
        })
    }

    pub fn now(&self) -> EpochMs {
        self.now
    }

    pub fn reputation(&self) -> i32 {
        self.reputation
    }

    pub fn credits(&self) -> i64 {
        self.credits
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    pub fn active_job(&self) -> Option<&Job> {
        self.active.as_ref().map(|a| &a.job)
    }

    pub fn mail(&self) -> &[DelayedMessage] {
        &self.mail
    }

    pub fn visible(&self) -> Vec<&Job> {
        visible_missions(&self.state, self.now)
    }

    /// Advance the clock, fail an overdue active job, then run expiry and
    /// refresh in that order.
    pub fn tick(&mut self, minutes: u32) -> TickReport {
        self.now += minutes_to_ms(minutes);

        let overdue = self.active.as_ref().and_then(|a| {
            let limit = a.job.time_limit_minutes?;
            (a.accepted_at + minutes_to_ms(limit) <= self.now).then(|| a.job.job_id.clone())
        });
        let deadline_failure = overdue.and_then(|id| match self.fail(&id, FailureReason::Deadline) {
            Ok(failure) => Some(failure),
            Err(err) => {
                warn!(job = %id, error = %err, "could not fail overdue job");
                None
            }
        });

        let active_id = self.active.as_ref().map(|a| a.job.job_id.clone());
        let state = std::mem::take(&mut self.state);
        let (state, events) =
            self.manager
                .process_expired_missions(state, self.reputation, self.now, active_id.as_ref(), &mut self.rng);
        self.state = self.manager.refresh_pool(state, self.reputation, self.now, active_id.as_ref(), &mut self.rng);

        info!(now = self.now, events = events.len(), size = self.state.size(), "tick");
        TickReport { now: self.now, events, deadline_failure }
    }

    pub fn accept(&mut self, job_id: &JobId) -> Result<Job> {
        if let Some(active) = &self.active {
            bail!("job {} is already in progress", active.job.job_id);
        }
        let job = self
            .state
            .find(job_id)
            .filter(|j| j.is_visible(self.now))
            .cloned()
            .ok_or_else(|| anyhow!("job {job_id} is not on offer"))?;
        if job.is_expired(self.now) {
            bail!("job {job_id} has expired");
        }
        if !job.is_accessible(self.reputation) {
            bail!("job {job_id} needs reputation {}, you have {}", job.requirements.min_reputation, self.reputation);
        }

        let state = std::mem::take(&mut self.state);
        self.state = self.manager.remove_mission_from_pool(state, job_id);
        let mut job = job;
        job.expires_at = None;
        self.active = Some(ActiveJob { job: job.clone(), accepted_at: self.now });
        info!(job = %job.job_id, title = %job.title, "job accepted");
        Ok(job)
    }

    pub fn complete(&mut self, job_id: &JobId) -> Result<Completion> {
        let active = self.take_active(job_id)?;
        let outcome = active.job.consequences.success.clone();
        self.credits += outcome.credits;
        self.reputation += outcome.reputation;
        self.mail.extend(outcome.messages);

        let state = std::mem::take(&mut self.state);
        let (state, progress) = self.manager.handle_arc_progression(state, &active.job, self.now, &mut self.rng);
        self.state = state;
        info!(job = %job_id, credits = outcome.credits, "job completed");
        Ok(Completion { job_id: job_id.clone(), credits: outcome.credits, reputation: outcome.reputation, progress })
    }

    pub fn fail(&mut self, job_id: &JobId, reason: FailureReason) -> Result<Failure> {
        let active = self.take_active(job_id)?;
        let outcome = active.job.consequences.failure.outcome_for(reason);
        self.credits += outcome.credits;
        self.reputation += outcome.reputation;
        self.mail.extend(outcome.messages);

        let state = std::mem::take(&mut self.state);
        let (state, arc) = self.manager.handle_arc_failure(state, &active.job);
        self.state = state;
        info!(job = %job_id, reason = ?reason, credits = outcome.credits, "job failed");
        Ok(Failure { job_id: job_id.clone(), reason, credits: outcome.credits, reputation: outcome.reputation, arc })
    }

    /// Each job settles once. A second complete or fail for the same id is an
    /// error here, before the pool ever sees it.
    fn take_active(&mut self, job_id: &JobId) -> Result<ActiveJob> {
        if self.finalized.contains(job_id) {
            bail!("job {job_id} was already settled");
        }
        match self.active.take() {
            Some(active) if &active.job.job_id == job_id => {
                self.finalized.insert(job_id.clone());
                Ok(active)
            }
            other => {
                self.active = other;
                Err(anyhow!("job {job_id} is not the active job"))
            }
        }
    }

    pub fn stats(&self) -> PoolStats {
        pool_stats(&self.state, self.reputation)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            now: self.now,
            reputation: self.reputation,
            credits: self.credits,
            active_job: self.active.as_ref().map(|a| a.job.job_id.clone()),
            visible: self.visible().into_iter().map(|j| JobSummary::new(j, self.reputation)).collect(),
            stats: self.stats(),
        }
    }
}
