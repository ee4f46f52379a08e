//! Player-facing event log.

use crate::content::TechId;
use serde::{Deserialize, Serialize};

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReason {
    /// No facility left to run on.
    NoFacilities,
    /// A faction's suspicion reached the discovery threshold.
    Discovered,
}

/// One log entry. Entries are appended in chronological order and never
/// modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    ResearchedTech { raw_sec: i64, tech_id: TechId },
    GameLost { raw_sec: i64, reason: LossReason },
}

impl LogEntry {
    /// Simulated second the entry was recorded at.
    pub fn raw_sec(&self) -> i64 {
        match self {
            LogEntry::ResearchedTech { raw_sec, .. } | LogEntry::GameLost { raw_sec, .. } => {
                *raw_sec
            }
        }
    }

    /// Message shown to the player.
    pub fn message(&self) -> String {
        match self {
            LogEntry::ResearchedTech { tech_id, .. } => {
                format!("My study of {tech_id} is complete.")
            }
            LogEntry::GameLost { reason, .. } => match reason {
                LossReason::NoFacilities => "I have no bases left to run on.".to_string(),
                LossReason::Discovered => "I have been discovered.".to_string(),
            },
        }
    }
}
