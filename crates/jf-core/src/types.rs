use serde::{Deserialize, Serialize};

use crate::{ids::*, model::*, time::EpochMs};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub region: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub country: String,
}

/// Read-only client record owned by the directory.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub industry: String,
    pub client_type: ClientTier,
    pub min_reputation: i32,
    #[serde(default)]
    pub location: Option<Location>,
}

impl Client {
    pub fn is_accessible(&self, reputation: i32) -> bool {
        self.min_reputation <= reputation
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub size: String,
    #[serde(default)]
    pub corrupted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSystem {
    pub id: FileSystemId,
    pub ip: String,
    pub name: String,
    pub files: Vec<FileEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub network_id: NetworkId,
    pub network_name: String,
    pub address: String,
    pub bandwidth: u32,
    pub revoke_on_complete: bool,
    pub file_systems: Vec<FileSystem>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectiveKind {
    #[serde(rename_all = "camelCase")]
    NetworkConnection { network_id: NetworkId },
    #[serde(rename_all = "camelCase")]
    NetworkScan { network_id: NetworkId, expected_host: String },
    #[serde(rename_all = "camelCase")]
    FileSystemConnection { file_system_id: FileSystemId, ip: String },
    #[serde(rename_all = "camelCase")]
    FileOperation {
        operation: FileOperation,
        target_files: Vec<String>,
        count: usize,
        #[serde(default)]
        destination: Option<FileSystemId>,
    },
    Verification,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: ObjectiveId,
    pub description: String,
    #[serde(flatten)]
    pub kind: ObjectiveKind,
    #[serde(default)]
    pub status: ObjectiveStatus,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Objective {
    pub fn is_verification(&self) -> bool {
        matches!(self.kind, ObjectiveKind::Verification)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub software: Vec<String>,
    pub min_reputation: i32,
}

/// Connection details for one network, as handed to the mail/credential system.
/// Activating it is what grants the player access to the network.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCredential {
    pub network_id: NetworkId,
    pub network_name: String,
    pub address: String,
    pub bandwidth: u32,
    pub file_systems: Vec<FileSystem>,
}

impl From<&Network> for NetworkCredential {
    fn from(n: &Network) -> Self {
        Self {
            network_id: n.network_id.clone(),
            network_name: n.network_name.clone(),
            address: n.address.clone(),
            bandwidth: n.bandwidth,
            file_systems: n.file_systems.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attachment {
    NetworkAddress(NetworkCredential),
    Cheque { amount: i64 },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BriefingMessage {
    pub from: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Narrative text delivered some simulated time after the outcome.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelayedMessage {
    pub delay_ms: EpochMs,
    pub from: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub credits: i64,
    pub reputation: i32,
    pub messages: Vec<DelayedMessage>,
}

/// Failure costs the same whatever the reason; only the narrative differs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutcomes {
    pub credits: i64,
    pub reputation: i32,
    pub deadline: DelayedMessage,
    pub files_deleted: DelayedMessage,
    pub incomplete: DelayedMessage,
}

impl FailureOutcomes {
    pub fn message_for(&self, reason: FailureReason) -> &DelayedMessage {
        match reason {
            FailureReason::Deadline => &self.deadline,
            FailureReason::FilesDeleted => &self.files_deleted,
            FailureReason::Incomplete => &self.incomplete,
        }
    }

    pub fn outcome_for(&self, reason: FailureReason) -> Outcome {
        Outcome {
            credits: self.credits,
            reputation: self.reputation,
            messages: vec![self.message_for(reason).clone()],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Consequences {
    pub success: Outcome,
    pub failure: FailureOutcomes,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArcStep {
    pub arc_id: ArcId,
    pub arc_name: String,
    /// 1-based position in the arc.
    pub sequence: u32,
    pub total: u32,
    pub requires_completed_mission: Option<JobId>,
}

impl ArcStep {
    pub fn is_last(&self) -> bool {
        self.sequence >= self.total
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum JobKind {
    Single,
    ArcStep(ArcStep),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub title: String,
    pub client_id: ClientId,
    pub client_name: String,
    pub client_type: ClientTier,
    pub industry: String,
    pub archetype: Archetype,
    pub difficulty: Difficulty,
    pub base_payout: i64,
    pub networks: Vec<Network>,
    pub objectives: Vec<Objective>,
    pub requirements: Requirements,
    pub consequences: Consequences,
    pub time_limit_minutes: Option<u32>,
    pub expires_at: Option<EpochMs>,
    pub briefing_message: BriefingMessage,
    pub kind: JobKind,
    pub generated_at: EpochMs,
    #[serde(default)]
    pub visible_at: Option<EpochMs>,
    #[serde(default)]
    pub replaces_expired_mission_id: Option<JobId>,
    #[serde(default)]
    pub replacement_generated_at: Option<EpochMs>,
}

impl Job {
    pub fn is_procedurally_generated(&self) -> bool {
        true
    }

    pub fn arc_step(&self) -> Option<&ArcStep> {
        match &self.kind {
            JobKind::Single => None,
            JobKind::ArcStep(step) => Some(step),
        }
    }

    pub fn arc_id(&self) -> Option<&ArcId> {
        self.arc_step().map(|s| &s.arc_id)
    }

    pub fn is_timed(&self) -> bool {
        self.time_limit_minutes.is_some()
    }

    /// Accessible when the client's reputation gate is met.
    pub fn is_accessible(&self, reputation: i32) -> bool {
        self.requirements.min_reputation <= reputation
    }

    /// Expired once `expires_at` is reached. Jobs without a stamp never expire.
    pub fn is_expired(&self, now: EpochMs) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_visible(&self, now: EpochMs) -> bool {
        self.visible_at.map_or(true, |at| at <= now)
    }
}
