use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use jf_arcs::StorylineCatalog;
use jf_clients::ClientDirectory;
use jf_core::{EpochMs, FailureReason, JobId};
use jf_pool::{ArcFailure, ArcProgress, PoolEvent, PoolStats};

use crate::{Config, Session};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationPlan {
    pub ticks: u32,
    pub minutes_per_tick: u32,
    /// Fail every n-th settled job instead of completing it.
    pub fail_every: Option<u32>,
    pub fail_reason: FailureReason,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub ticks: u32,
    pub final_time_ms: EpochMs,
    pub credits: i64,
    pub reputation: i32,
    pub accepted: u32,
    pub completed: u32,
    pub failed: u32,
    pub deadline_failures: u32,
    pub arc_steps_revealed: u32,
    pub arcs_completed: u32,
    pub arcs_cancelled: u32,
    pub expired: u32,
    pub replacements: u32,
    pub stats: PoolStats,
}

/// Scripted play: each tick settles the job accepted on the previous tick,
/// then takes the best-paying accessible job on offer.
pub fn simulate(
    cfg: &Config,
    directory: &dyn ClientDirectory,
    catalog: &StorylineCatalog,
    plan: &SimulationPlan,
) -> Result<SimulationSummary> {
    let mut session = Session::open(cfg, directory, catalog)?;
    let mut summary = SimulationSummary { ticks: plan.ticks, ..Default::default() };
    let mut settled: u32 = 0;

    for _ in 0..plan.ticks {
        let report = session.tick(plan.minutes_per_tick);
        for event in &report.events {
            match event {
                PoolEvent::MissionExpired { .. } => summary.expired += 1,
                PoolEvent::ReplacementScheduled { .. } => summary.replacements += 1,
                PoolEvent::ArcCancelled { .. } => summary.arcs_cancelled += 1,
                PoolEvent::ReplacementRevealed { .. } => {}
            }
        }
        if let Some(failure) = &report.deadline_failure {
            settled += 1;
            summary.failed += 1;
            summary.deadline_failures += 1;
            if matches!(failure.arc, ArcFailure::Cancelled { .. }) {
                summary.arcs_cancelled += 1;
            }
        }

        if let Some(job_id) = session.active_job().map(|j| j.job_id.clone()) {
            settled += 1;
            let fail_now = plan.fail_every.is_some_and(|n| n > 0 && settled % n == 0);
            if fail_now {
                let failure = session.fail(&job_id, plan.fail_reason)?;
                summary.failed += 1;
                if matches!(failure.arc, ArcFailure::Cancelled { .. }) {
                    summary.arcs_cancelled += 1;
                }
            } else {
                let completion = session.complete(&job_id)?;
                summary.completed += 1;
                match completion.progress {
                    ArcProgress::Revealed { .. } => summary.arc_steps_revealed += 1,
                    ArcProgress::ArcCompleted { .. } => summary.arcs_completed += 1,
                    ArcProgress::NotArc | ArcProgress::Orphaned { .. } | ArcProgress::AlreadyProcessed => {}
                }
            }
        }

        if let Some(pick) = best_offer(&session) {
            session.accept(&pick)?;
            summary.accepted += 1;
        }
    }

    summary.final_time_ms = session.now();
    summary.credits = session.credits();
    summary.reputation = session.reputation();
    summary.stats = session.stats();
    debug!(?summary, "simulation finished");
    Ok(summary)
}

fn best_offer(session: &Session<'_>) -> Option<JobId> {
    let now = session.now();
    session
        .visible()
        .into_iter()
        .filter(|j| j.is_accessible(session.reputation()) && !j.is_expired(now))
        .max_by_key(|j| j.base_payout)
        .map(|j| j.job_id.clone())
}
