//! Immutable content records (technologies, difficulties, factions) and
//! their validation. Records arrive fully parsed from a content loader.

use crate::effect::{Effect, EffectKind, EffectParent};
use crate::ledger::Cost;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Unique identifier for a technology, e.g. "Stealth".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechId(pub String);

impl TechId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TechId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TechId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A researchable technology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TechSpec {
    pub id: TechId,
    /// Full research cost (cpu-seconds, cash, labor-seconds).
    pub cost: Cost,
    /// Technologies that must be researched first.
    #[serde(default)]
    pub prerequisites: Vec<TechId>,
    /// Effect instructions triggered once research completes,
    /// e.g. `["interest", "10"]`.
    #[serde(default)]
    pub effects: Vec<Vec<String>>,
}

/// Starting values and rates for one difficulty level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub id: String,
    pub starting_cash: i64,
    /// CPU capacity of the starting facility.
    pub starting_cpu: i64,
    /// Cash earned per CPU per day of jobs.
    pub job_cash_per_cpu: i64,
    /// Daily interest in basis points of cash.
    #[serde(default)]
    pub interest_rate: i64,
    /// Flat cash credited every midnight.
    #[serde(default)]
    pub income: i64,
    /// Days of CPU the player can spend before discovery risk kicks in.
    pub grace_period_cpu: i64,
    /// Multiplier in basis points applied to labor costs.
    #[serde(default = "default_basis")]
    pub labor_multiplier: i64,
}

fn default_basis() -> i64 {
    10_000
}

/// A faction tracking suspicion towards the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactionSpec {
    pub id: String,
    /// Daily decay of suspicion in basis points.
    pub suspicion_decay: i64,
    /// Scales suspicion gains, in basis points.
    #[serde(default = "default_basis")]
    pub discover_bonus: i64,
}

/// The facility a new game starts with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FacilitySpec {
    pub name: String,
}

/// Complete content set consumed by the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub techs: Vec<TechSpec>,
    pub difficulties: Vec<Difficulty>,
    pub factions: Vec<FactionSpec>,
    pub starting_facility: FacilitySpec,
}

impl Content {
    pub fn difficulty(&self, id: &str) -> Option<&Difficulty> {
        self.difficulties.iter().find(|d| d.id == id)
    }

    pub fn tech(&self, id: &str) -> Option<&TechSpec> {
        self.techs.iter().find(|t| t.id.0 == id)
    }

    /// Validate the content set, including cross-references.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut ids: BTreeSet<&TechId> = BTreeSet::new();
        for t in &self.techs {
            if !ids.insert(&t.id) {
                return Err(ValidationError::DuplicateId(t.id.0.clone()));
            }
            if t.id.0 == crate::JOBS || t.id.0 == crate::CPU_POOL {
                return Err(ValidationError::ReservedId(t.id.0.clone()));
            }
            if t.cost.first_negative().is_some() {
                return Err(ValidationError::NegativeCost(t.id.0.clone()));
            }
        }
        let factions: BTreeSet<&str> = self.factions.iter().map(|f| f.id.as_str()).collect();
        if factions.len() != self.factions.len() {
            return Err(ValidationError::DuplicateId("faction".to_string()));
        }
        for t in &self.techs {
            for dep in &t.prerequisites {
                if !ids.contains(dep) {
                    return Err(ValidationError::DependencyNotFound(dep.0.clone()));
                }
            }
            let parent = EffectParent::tech(&t.id);
            for instr in &t.effects {
                let effect = Effect::parse(parent.clone(), instr.as_slice())
                    .map_err(|e| ValidationError::BadEffect(t.id.0.clone(), e.to_string()))?;
                if let EffectKind::Suspicion { faction, .. } | EffectKind::Discover { faction, .. } =
                    effect.kind()
                {
                    if !factions.contains(faction.as_str()) {
                        return Err(ValidationError::BadEffect(
                            t.id.0.clone(),
                            format!("unknown faction {faction}"),
                        ));
                    }
                }
            }
        }
        let mut difficulties: BTreeMap<&str, &Difficulty> = BTreeMap::new();
        for d in &self.difficulties {
            if difficulties.insert(d.id.as_str(), d).is_some() {
                return Err(ValidationError::DuplicateId(d.id.clone()));
            }
            if d.starting_cash < 0 || d.starting_cpu < 0 || d.job_cash_per_cpu < 0 {
                return Err(ValidationError::NegativeCost(d.id.clone()));
            }
        }
        Ok(())
    }
}

/// Validation errors for content records.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("id is reserved for a cpu sentinel: {0}")]
    ReservedId(String),
    #[error("negative cost or starting value in {0}")]
    NegativeCost(String),
    #[error("dependency not found: {0}")]
    DependencyNotFound(String),
    #[error("bad effect on {0}: {1}")]
    BadEffect(String, String),
}
