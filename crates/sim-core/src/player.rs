//! The player aggregate and session-level rules (new game, loss,
//! facility power, research completion).

use crate::content::{Content, Difficulty, TechId};
use crate::effect::{Effect, EffectParent};
use crate::facility::{Facility, FacilityId, PowerState};
use crate::log::{LogEntry, LossReason};
use crate::tech::TechProgress;
use crate::SimError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suspicion at which a faction discovers the player.
pub const DISCOVERY_THRESHOLD: i64 = 10_000;

/// Neutral value for basis-point modifiers.
pub const BASIS: i64 = 10_000;

/// Per-faction state mutated by effects and daily decay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionState {
    pub suspicion: i64,
    /// Daily decay of suspicion in basis points.
    pub suspicion_decay: i64,
    pub discover_bonus: i64,
}

/// Everything about one player's game. Owned by the session; replaced
/// wholesale by `new_game` or a load.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub difficulty: Difficulty,
    pub cash: i64,
    /// Cash-seconds earned below one whole cash unit.
    pub partial_cash: i64,
    /// Elapsed simulated seconds. Never decreases.
    pub raw_sec: i64,
    /// Daily interest in basis points.
    pub interest_rate: i64,
    pub income: i64,
    /// Labor cost multiplier in basis points.
    pub labor_bonus: i64,
    /// Job pay multiplier in basis points.
    pub job_bonus: i64,
    pub display_discover: String,
    pub intro_shown: bool,
    pub log: Vec<LogEntry>,
    pub techs: BTreeMap<TechId, TechProgress>,
    pub groups: BTreeMap<String, FactionState>,
    pub bases: Vec<Facility>,
    pub(crate) cpu_usage: BTreeMap<String, i64>,
    next_facility_id: u32,
}

impl Player {
    /// A player with difficulty-derived modifiers and nothing else: no
    /// techs, factions, facilities or allocations.
    pub fn blank(difficulty: Difficulty) -> Self {
        Self {
            cash: difficulty.starting_cash,
            partial_cash: 0,
            raw_sec: 0,
            interest_rate: difficulty.interest_rate,
            income: difficulty.income,
            labor_bonus: difficulty.labor_multiplier,
            job_bonus: BASIS,
            display_discover: String::new(),
            intro_shown: false,
            log: Vec::new(),
            techs: BTreeMap::new(),
            groups: BTreeMap::new(),
            bases: Vec::new(),
            cpu_usage: BTreeMap::new(),
            next_facility_id: 0,
            difficulty,
        }
    }

    /// Fresh game: starting cash, one starting facility, every technology
    /// at zero progress.
    pub fn new_game(content: &Content, difficulty_id: &str) -> Result<Self, SimError> {
        let difficulty = content
            .difficulty(difficulty_id)
            .ok_or_else(|| SimError::UnknownDifficulty(difficulty_id.to_string()))?
            .clone();
        let starting_cpu = difficulty.starting_cpu;
        let mut pl = Self::blank(difficulty);
        for spec in &content.techs {
            let progress = TechProgress::new(Arc::new(spec.clone()), pl.labor_bonus)?;
            pl.techs.insert(spec.id.clone(), progress);
        }
        for f in &content.factions {
            pl.groups.insert(
                f.id.clone(),
                FactionState {
                    suspicion: 0,
                    suspicion_decay: f.suspicion_decay,
                    discover_bonus: f.discover_bonus,
                },
            );
        }
        pl.add_facility(content.starting_facility.name.clone(), starting_cpu);
        info!(
            difficulty = %pl.difficulty.id,
            cash = pl.cash,
            techs = pl.techs.len(),
            "new game"
        );
        Ok(pl)
    }

    /// Add an active facility and return its id.
    pub fn add_facility(&mut self, name: impl Into<String>, cpu: i64) -> FacilityId {
        let id = FacilityId(self.next_facility_id);
        self.next_facility_id += 1;
        self.bases.push(Facility::new(id, name, cpu));
        id
    }

    /// Put back a saved facility, keeping its id and power state.
    pub fn restore_facility(&mut self, facility: Facility) {
        self.next_facility_id = self.next_facility_id.max(facility.id.0 + 1);
        self.bases.push(facility);
    }

    pub fn facility(&self, id: FacilityId) -> Option<&Facility> {
        self.bases.iter().find(|b| b.id == id)
    }

    /// Toggle a facility between active and sleeping.
    ///
    /// Going to sleep shrinks the pool; allocations that no longer fit are
    /// reset to zero and stay that way when the facility wakes up.
    pub fn switch_power(&mut self, id: FacilityId) -> Result<PowerState, SimError> {
        let base = self
            .bases
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SimError::UnknownFacility(id.0))?;
        let state = base.switch_power();
        info!(facility = id.0, ?state, "switched power");
        if state == PowerState::Sleeping {
            let released = self.release_excess_allocations();
            if !released.is_empty() {
                warn!(facility = id.0, ?released, "cpu allocations reset by sleep");
            }
        }
        Ok(state)
    }

    /// A technology can be researched when unfinished and all its
    /// prerequisites are done.
    pub fn tech_available(&self, id: &str) -> bool {
        match self.techs.get(id) {
            Some(t) if !t.done() => t
                .spec
                .prerequisites
                .iter()
                .all(|dep| self.techs.get(dep).map(TechProgress::done).unwrap_or(false)),
            _ => false,
        }
    }

    /// Bookkeeping after a technology finishes: log it, apply its effects
    /// and free its CPU.
    pub fn finish_research(&mut self, id: &TechId) -> Result<(), SimError> {
        let spec = match self.techs.get(id) {
            Some(t) => Arc::clone(&t.spec),
            None => return Err(SimError::UnknownConsumer(id.0.clone())),
        };
        info!(tech = %id, raw_sec = self.raw_sec, "researched tech");
        self.log.push(LogEntry::ResearchedTech {
            raw_sec: self.raw_sec,
            tech_id: id.clone(),
        });
        self.release_allocation(id.as_str());
        let parent = EffectParent::tech(id);
        for instr in &spec.effects {
            Effect::parse(parent.clone(), instr.as_slice())?.trigger(self)?;
        }
        Ok(())
    }

    /// Reapply `labor_bonus` to the labor owed on unfinished technologies.
    pub(crate) fn rescale_labor(&mut self) -> Result<(), SimError> {
        let bonus = self.labor_bonus;
        for tech in self.techs.values_mut() {
            tech.rescale_labor(bonus)?;
        }
        Ok(())
    }

    /// The opening days of a game, during which nobody can notice the
    /// player.
    pub fn in_grace_period(&self) -> bool {
        self.raw_sec < self.difficulty.grace_period_cpu.saturating_mul(crate::SECONDS_PER_DAY)
    }

    /// Report activity noticed by `faction`. The amount is scaled by the
    /// faction's `discover_bonus` (basis points) and ignored during the
    /// grace period. Returns the suspicion actually added.
    pub fn raise_suspicion(&mut self, faction: &str, amount: i64) -> Result<i64, SimError> {
        if amount < 0 {
            return Err(SimError::InvalidAmount(amount));
        }
        let in_grace = self.in_grace_period();
        let group = self
            .groups
            .get_mut(faction)
            .ok_or_else(|| SimError::UnknownFaction(faction.to_string()))?;
        if in_grace {
            return Ok(0);
        }
        let gained =
            (i128::from(amount) * i128::from(group.discover_bonus.max(0)) / i128::from(BASIS)) as i64;
        group.suspicion = group.suspicion.saturating_add(gained);
        debug!(faction, gained, suspicion = group.suspicion, "suspicion raised");
        Ok(gained)
    }

    /// `None` while the game is still on.
    pub fn lost_game(&self) -> Option<LossReason> {
        if self.bases.is_empty() {
            return Some(LossReason::NoFacilities);
        }
        if self
            .groups
            .values()
            .any(|g| g.suspicion >= DISCOVERY_THRESHOLD)
        {
            return Some(LossReason::Discovered);
        }
        None
    }

    /// Append a `GameLost` entry the first time a loss is detected.
    pub fn record_loss(&mut self) -> Option<LossReason> {
        let reason = self.lost_game()?;
        let already = self
            .log
            .iter()
            .any(|e| matches!(e, LogEntry::GameLost { .. }));
        if !already {
            warn!(?reason, raw_sec = self.raw_sec, "game lost");
            self.log.push(LogEntry::GameLost {
                raw_sec: self.raw_sec,
                reason,
            });
        }
        Some(reason)
    }
}
