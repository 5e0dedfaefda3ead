use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use jf_arcs::{StoryStep, Storyline};
use jf_clients::ClientDirectory;
use jf_core::{
    ArcId, ArcStep, Archetype, Client, ClientId, EpochMs, Job, JobId, JobKind, Requirements,
};
use jf_infra::{synthesize, InfraRequest};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::briefing::{build_briefing, build_consequences, BriefingInput, Narrative};
use crate::objectives::build_objectives;
use crate::payout::{calculate_payout, calculate_time_limit, difficulty_for_file_count};

pub const DEFAULT_TIMED_CHANCE: f64 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct GenerateOptions {
    /// Fixed archetype; weighted random when absent.
    pub archetype: Option<Archetype>,
    /// Force timed or untimed; otherwise `timed_chance` decides.
    pub timed: Option<bool>,
    pub timed_chance: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { archetype: None, timed: None, timed_chance: DEFAULT_TIMED_CHANCE }
    }
}

/// Per-archetype shape of a job.
struct ArchetypePlan {
    files: RangeInclusive<usize>,
    corrupted: bool,
    second_network: bool,
    title: &'static str,
    software: &'static [&'static str],
}

fn plan_for(archetype: Archetype) -> ArchetypePlan {
    match archetype {
        Archetype::Repair => ArchetypePlan {
            files: 3..=8,
            corrupted: true,
            second_network: false,
            title: "Data Recovery",
            software: &["file-manager", "network-scanner", "repair-tool"],
        },
        Archetype::Backup => ArchetypePlan {
            files: 3..=10,
            corrupted: false,
            second_network: true,
            title: "Offsite Backup",
            software: &["file-manager", "network-scanner"],
        },
        Archetype::Transfer => ArchetypePlan {
            files: 2..=6,
            corrupted: false,
            second_network: true,
            title: "Data Migration",
            software: &["file-manager", "network-scanner"],
        },
    }
}

/// Weighted pick: repair 40, backup 35, transfer 25.
pub fn pick_archetype<R: Rng + ?Sized>(rng: &mut R) -> Archetype {
    let mut roll = rng.gen_range(0..100);
    for a in Archetype::ALL {
        if roll < a.weight() {
            return a;
        }
        roll -= a.weight();
    }
    Archetype::Transfer
}

/// Build one complete job for `client`: infrastructure, objectives, time
/// limit, payout, briefing, consequences.
pub fn build_job<R: Rng>(
    client: &Client,
    archetype: Archetype,
    timed: bool,
    narrative: &Narrative,
    now: EpochMs,
    rng: &mut R,
) -> Job {
    let plan = plan_for(archetype);
    let file_count = rng.gen_range(plan.files.clone());
    let infra = synthesize(
        &InfraRequest {
            client,
            archetype,
            file_count,
            corrupted: plan.corrupted,
            second_network: plan.second_network,
        },
        rng,
    );
    let objectives = build_objectives(archetype, &infra, rng);
    let time_limit_minutes = timed.then(|| calculate_time_limit(objectives.len()));
    let base_payout = calculate_payout(objectives.len(), client.client_type, time_limit_minutes);

    let title = match narrative.part {
        Some((sequence, total)) => format!("{}: {} (Part {} of {})", plan.title, client.name, sequence, total),
        None => format!("{}: {}", plan.title, client.name),
    };
    let briefing_message = build_briefing(
        &BriefingInput {
            client,
            title: &title,
            archetype,
            infra: &infra,
            objectives: &objectives,
            time_limit_minutes,
            payout: base_payout,
            narrative,
        },
        rng,
    );
    let consequences = build_consequences(client, &title, base_payout);

    let job = Job {
        job_id: JobId::generate(rng),
        title,
        client_id: client.id.clone(),
        client_name: client.name.clone(),
        client_type: client.client_type,
        industry: client.industry.clone(),
        archetype,
        difficulty: difficulty_for_file_count(file_count),
        base_payout,
        networks: infra.networks,
        objectives,
        requirements: Requirements {
            software: plan.software.iter().map(|s| s.to_string()).collect(),
            min_reputation: client.min_reputation,
        },
        consequences,
        time_limit_minutes,
        expires_at: None,
        briefing_message,
        kind: JobKind::Single,
        generated_at: now,
        visible_at: None,
        replaces_expired_mission_id: None,
        replacement_generated_at: None,
    };
    debug!(
        job = %job.job_id,
        client = %job.client_id,
        archetype = %archetype,
        payout = job.base_payout,
        timed = job.is_timed(),
        "built job"
    );
    job
}

/// A whole arc; only the first mission starts visible.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArc {
    pub arc_id: ArcId,
    pub arc_name: String,
    pub storyline_id: String,
    pub total_missions: u32,
    pub missions: Vec<Job>,
    pub visible_mission_ids: Vec<JobId>,
}

impl GeneratedArc {
    pub fn client_ids(&self) -> BTreeSet<ClientId> {
        self.missions.iter().map(|m| m.client_id.clone()).collect()
    }

    /// First mission and the hidden continuations, in order.
    pub fn into_parts(self) -> Option<(Job, Vec<Job>)> {
        let mut missions = self.missions.into_iter();
        let first = missions.next()?;
        Some((first, missions.collect()))
    }
}

pub struct MissionGenerator<'a> {
    directory: &'a dyn ClientDirectory,
    timed_chance: f64,
}

impl<'a> MissionGenerator<'a> {
    pub fn new(directory: &'a dyn ClientDirectory) -> Self {
        Self { directory, timed_chance: DEFAULT_TIMED_CHANCE }
    }

    pub fn with_timed_chance(mut self, chance: f64) -> Self {
        self.timed_chance = chance.clamp(0.0, 1.0);
        self
    }

    pub fn directory(&self) -> &'a dyn ClientDirectory {
        self.directory
    }

    pub fn timed_chance(&self) -> f64 {
        self.timed_chance
    }

    /// None when the client id is unknown. That is logged, not raised.
    pub fn generate_mission<R: Rng>(
        &self,
        client_id: &ClientId,
        options: &GenerateOptions,
        now: EpochMs,
        rng: &mut R,
    ) -> Option<Job> {
        let Some(client) = self.directory.client_by_id(client_id) else {
            warn!(client = %client_id, "client not found, no mission generated");
            return None;
        };
        let archetype = options.archetype.unwrap_or_else(|| pick_archetype(rng));
        let timed = options
            .timed
            .unwrap_or_else(|| rng.gen_bool(options.timed_chance.clamp(0.0, 1.0)));
        Some(build_job(&client, archetype, timed, &Narrative::default(), now, rng))
    }

    /// Build every mission of `storyline`. Step one uses `clients[0]`; later
    /// steps look up a client through the step's filters and fall back to the
    /// previous step's client when there is no filter or no match.
    pub fn generate_mission_arc<R: Rng>(
        &self,
        storyline: &Storyline,
        clients: &[Client],
        exclude: &BTreeSet<ClientId>,
        now: EpochMs,
        rng: &mut R,
    ) -> Option<GeneratedArc> {
        if storyline.is_empty() || clients.len() < storyline.len() {
            debug!(
                storyline = %storyline.id,
                clients = clients.len(),
                needed = storyline.len(),
                "not enough clients for arc"
            );
            return None;
        }

        let arc_id = ArcId::generate(rng);
        let total = storyline.len() as u32;
        let mut used: BTreeSet<ClientId> = BTreeSet::new();
        let mut missions: Vec<Job> = Vec::with_capacity(storyline.len());
        let mut previous_client = clients[0].clone();

        for (i, step) in storyline.mission_sequence.iter().enumerate() {
            let client = if i == 0 {
                clients[0].clone()
            } else {
                self.resolve_step_client(step, &previous_client, &used, exclude, rng)
            };
            used.insert(client.id.clone());

            let sequence = i as u32 + 1;
            let timed = step.has_timed.unwrap_or_else(|| rng.gen_bool(self.timed_chance));
            let narrative = Narrative {
                intro: Some(step.render_narrative(&client.name)),
                referral: if i > 0 { step.referral_text.clone() } else { None },
                part: Some((sequence, total)),
            };
            let mut job = build_job(&client, step.archetype, timed, &narrative, now, rng);
            job.kind = JobKind::ArcStep(ArcStep {
                arc_id: arc_id.clone(),
                arc_name: storyline.name.clone(),
                sequence,
                total,
                requires_completed_mission: missions.last().map(|prev: &Job| prev.job_id.clone()),
            });
            missions.push(job);
            previous_client = client;
        }

        let visible_mission_ids = missions.first().map(|m| vec![m.job_id.clone()]).unwrap_or_default();
        debug!(arc = %arc_id, storyline = %storyline.id, steps = missions.len(), "generated arc");
        Some(GeneratedArc {
            arc_id,
            arc_name: storyline.name.clone(),
            storyline_id: storyline.id.clone(),
            total_missions: total,
            missions,
            visible_mission_ids,
        })
    }

    fn resolve_step_client<R: Rng>(
        &self,
        step: &StoryStep,
        previous: &Client,
        used: &BTreeSet<ClientId>,
        exclude: &BTreeSet<ClientId>,
        rng: &mut R,
    ) -> Client {
        if !step.has_client_filter() {
            return previous.clone();
        }
        let pool = match &step.client_industry_filter {
            Some(industry) => self.directory.clients_by_industry(industry),
            None => self.directory.all_clients(),
        };
        let candidates: Vec<Client> = pool
            .into_iter()
            .filter(|c| step.matches(c) && !used.contains(&c.id) && !exclude.contains(&c.id))
            .collect();
        match candidates.choose(rng) {
            Some(c) => c.clone(),
            None => {
                debug!(previous = %previous.id, "no client matches arc step filters, reusing previous client");
                previous.clone()
            }
        }
    }
}
