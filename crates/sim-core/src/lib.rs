#![deny(warnings)]

//! Core domain model for the CPU economy simulation.
//!
//! Defines the player aggregate and the components that mutate it:
//! resource ledgers, facility power states, the effect engine, the CPU
//! allocator and the fault-containment wrapper. Time advancement lives in
//! `sim-econ`; saving and loading in `persistence`.

pub mod allocator;
pub mod content;
pub mod effect;
pub mod error;
pub mod facility;
pub mod ledger;
pub mod log;
pub mod player;
pub mod safety;
pub mod tech;

pub use allocator::{CPU_POOL, JOBS};
pub use content::{Content, Difficulty, FacilitySpec, FactionSpec, TechId, TechSpec, ValidationError};
pub use effect::{Effect, EffectKind, EffectParent};
pub use error::SimError;
pub use facility::{Facility, FacilityId, PowerState};
pub use ledger::{Cost, Ledger, ResourceKind};
pub use log::{LogEntry, LossReason};
pub use player::{FactionState, Player, BASIS, DISCOVERY_THRESHOLD};
pub use tech::{TechProgress, WorkOutcome};

/// Simulated seconds in one game day.
pub const SECONDS_PER_DAY: i64 = 86_400;
