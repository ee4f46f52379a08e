//! Facility ("base") power state machine.

use serde::{Deserialize, Serialize};

/// Identifier of a facility, unique within one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    Active,
    Sleeping,
}

/// A facility contributing CPU capacity while active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    /// CPU units supplied while active.
    pub cpu: i64,
    power_state: PowerState,
}

impl Facility {
    pub fn new(id: FacilityId, name: impl Into<String>, cpu: i64) -> Self {
        Self {
            id,
            name: name.into(),
            cpu,
            power_state: PowerState::Active,
        }
    }

    /// Rebuild a facility in a known power state.
    pub fn with_power_state(mut self, state: PowerState) -> Self {
        self.power_state = state;
        self
    }

    pub fn power_state(&self) -> PowerState {
        self.power_state
    }

    pub fn is_active(&self) -> bool {
        self.power_state == PowerState::Active
    }

    /// CPU currently contributed to the pool.
    pub fn cpu_contribution(&self) -> i64 {
        if self.is_active() {
            self.cpu
        } else {
            0
        }
    }

    /// Toggle between active and sleeping; returns the new state.
    ///
    /// Allocation bookkeeping is done by [`crate::Player::switch_power`].
    pub(crate) fn switch_power(&mut self) -> PowerState {
        self.power_state = match self.power_state {
            PowerState::Active => PowerState::Sleeping,
            PowerState::Sleeping => PowerState::Active,
        };
        self.power_state
    }
}
