//! Serializable mirror of the player aggregate.
//!
//! Technologies are stored by id and relinked to content on load, so a
//! restored player never shares records with the one that was saved.

use crate::{SaveError, FORMAT_VERSION, SAVE_MAGIC};
use serde::{Deserialize, Serialize};
use sim_core::{
    Content, Cost, Facility, FactionState, Ledger, LogEntry, LossReason, Player, TechId,
    TechProgress,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Header written in front of every save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: String,
    pub version: u32,
    /// Simulated time at which the save was taken.
    pub raw_sec: i64,
    pub difficulty: String,
}

impl SaveHeader {
    pub fn new(raw_sec: i64, difficulty: &str) -> Self {
        Self {
            magic: SAVE_MAGIC.to_string(),
            version: FORMAT_VERSION,
            raw_sec,
            difficulty: difficulty.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != SAVE_MAGIC {
            return Err(SaveError::InvalidMagic);
        }
        if self.version != FORMAT_VERSION {
            return Err(SaveError::UnsupportedVersion {
                found: self.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct TechSave {
    id: String,
    total_cost: Cost,
    cost_paid: Cost,
    cost_left: Cost,
    done: bool,
}

/// Log entries in an externally tagged shape every codec can read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum LogSave {
    ResearchedTech { raw_sec: i64, tech_id: String },
    GameLost { raw_sec: i64, reason: LossReason },
}

impl From<&LogEntry> for LogSave {
    fn from(entry: &LogEntry) -> Self {
        match entry {
            LogEntry::ResearchedTech { raw_sec, tech_id } => LogSave::ResearchedTech {
                raw_sec: *raw_sec,
                tech_id: tech_id.0.clone(),
            },
            LogEntry::GameLost { raw_sec, reason } => LogSave::GameLost {
                raw_sec: *raw_sec,
                reason: *reason,
            },
        }
    }
}

impl From<LogSave> for LogEntry {
    fn from(entry: LogSave) -> Self {
        match entry {
            LogSave::ResearchedTech { raw_sec, tech_id } => LogEntry::ResearchedTech {
                raw_sec,
                tech_id: TechId(tech_id),
            },
            LogSave::GameLost { raw_sec, reason } => LogEntry::GameLost { raw_sec, reason },
        }
    }
}

/// Complete saved game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveGame {
    pub header: SaveHeader,
    cash: i64,
    partial_cash: i64,
    raw_sec: i64,
    interest_rate: i64,
    income: i64,
    labor_bonus: i64,
    job_bonus: i64,
    display_discover: String,
    intro_shown: bool,
    log: Vec<LogSave>,
    techs: Vec<TechSave>,
    groups: BTreeMap<String, FactionState>,
    bases: Vec<Facility>,
    cpu_usage: BTreeMap<String, i64>,
}

impl SaveGame {
    /// Copy everything needed to rebuild `player`.
    pub fn capture(player: &Player) -> Self {
        Self {
            header: SaveHeader::new(player.raw_sec, &player.difficulty.id),
            cash: player.cash,
            partial_cash: player.partial_cash,
            raw_sec: player.raw_sec,
            interest_rate: player.interest_rate,
            income: player.income,
            labor_bonus: player.labor_bonus,
            job_bonus: player.job_bonus,
            display_discover: player.display_discover.clone(),
            intro_shown: player.intro_shown,
            log: player.log.iter().map(LogSave::from).collect(),
            techs: player
                .techs
                .values()
                .map(|t| TechSave {
                    id: t.id().0.clone(),
                    total_cost: t.total_cost(),
                    cost_paid: t.cost_paid(),
                    cost_left: t.cost_left(),
                    done: t.done(),
                })
                .collect(),
            groups: player.groups.clone(),
            bases: player.bases.clone(),
            cpu_usage: player
                .allocations()
                .map(|(id, units)| (id.to_string(), units))
                .collect(),
        }
    }

    /// Build a new player from this save, relinking technologies to
    /// `content`. Technologies added to content since the save start fresh.
    pub fn restore(self, content: &Content) -> Result<Player, SaveError> {
        self.header.validate()?;
        let difficulty = content
            .difficulty(&self.header.difficulty)
            .ok_or_else(|| SaveError::UnknownDifficulty(self.header.difficulty.clone()))?
            .clone();
        let mut pl = Player::blank(difficulty);
        pl.cash = self.cash;
        pl.partial_cash = self.partial_cash;
        pl.raw_sec = self.raw_sec;
        pl.interest_rate = self.interest_rate;
        pl.income = self.income;
        pl.labor_bonus = self.labor_bonus;
        pl.job_bonus = self.job_bonus;
        pl.display_discover = self.display_discover;
        pl.intro_shown = self.intro_shown;
        pl.log = self.log.into_iter().map(LogEntry::from).collect();
        pl.groups = self.groups;

        let mut saved: BTreeMap<String, TechSave> =
            self.techs.into_iter().map(|t| (t.id.clone(), t)).collect();
        for spec in &content.techs {
            let spec = Arc::new(spec.clone());
            let progress = match saved.remove(spec.id.as_str()) {
                Some(t) => {
                    let ledger = Ledger::from_parts(t.total_cost, t.cost_paid, t.cost_left)?;
                    TechProgress::restore(spec, ledger, t.done)
                }
                None => TechProgress::new(spec, pl.labor_bonus)?,
            };
            pl.techs.insert(progress.id().clone(), progress);
        }
        if let Some(id) = saved.into_keys().next() {
            return Err(SaveError::UnknownTech(id));
        }

        for base in self.bases {
            pl.restore_facility(base);
        }
        pl.restore_allocations(self.cpu_usage)?;
        Ok(pl)
    }
}
