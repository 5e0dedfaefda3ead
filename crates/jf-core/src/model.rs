use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Job archetype. Decides infrastructure shape and objective list.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Archetype {
    Repair,
    Backup,
    Transfer,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Repair, Archetype::Backup, Archetype::Transfer];

    /// Selection weight out of 100 when the caller does not fix an archetype.
    pub fn weight(self) -> u32 {
        match self {
            Archetype::Repair => 40,
            Archetype::Backup => 35,
            Archetype::Transfer => 25,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Repair => "repair",
            Archetype::Backup => "backup",
            Archetype::Transfer => "transfer",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Archetype {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "repair" => Ok(Archetype::Repair),
            "backup" => Ok(Archetype::Backup),
            "transfer" => Ok(Archetype::Transfer),
            other => Err(ParseEnumError { kind: "archetype", value: other.to_string() }),
        }
    }
}

/// Client tier (`clientType`). Scales payout.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ClientTier {
    Individual,
    SmallBusiness,
    MidMarket,
    Enterprise,
    Government,
}

impl ClientTier {
    pub fn payout_multiplier(self) -> f64 {
        match self {
            ClientTier::Individual => 1.0,
            ClientTier::SmallBusiness => 1.2,
            ClientTier::MidMarket => 1.5,
            ClientTier::Enterprise => 2.0,
            ClientTier::Government => 2.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum LocationType {
    Office,
    Branch,
    Datacenter,
    Campus,
    Residence,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ObjectiveStatus {
    #[default]
    Pending,
    Complete,
    Skipped,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FileOperation {
    Repair,
    Copy,
    Paste,
    Delete,
}

/// Why a job failed; picks the failure narrative.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    Deadline,
    FilesDeleted,
    Incomplete,
}

impl FailureReason {
    pub const ALL: [FailureReason; 3] =
        [FailureReason::Deadline, FailureReason::FilesDeleted, FailureReason::Incomplete];
}

impl FromStr for FailureReason {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "deadline" => Ok(FailureReason::Deadline),
            "filesDeleted" | "files_deleted" => Ok(FailureReason::FilesDeleted),
            "incomplete" => Ok(FailureReason::Incomplete),
            other => Err(ParseEnumError { kind: "failure reason", value: other.to_string() }),
        }
    }
}
