#![deny(warnings)]

//! Runtime for the simulation: an explicitly owned [`Session`] that the
//! driver (CLI, UI loop, tests) holds and passes around.
//!
//! The session owns the player, the content it was built from, the game
//! speed and an optional view hook. Time advances through a contained call:
//! a faulting step is logged and rolled back instead of taking the process
//! down.

pub mod content;

pub use content::{load_content, standard_content, ContentError};

use persistence::{SaveEncoding, SaveError};
use sim_core::safety::contain;
use sim_core::{Content, FacilityId, Player, PowerState, SimError};
use sim_econ::{CashFlow, CpuFlow, Economy, TimeReport};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};

/// Simulated seconds per real second for each speed setting. Speed 0 is
/// paused.
pub const SPEED_MULTIPLIERS: [i64; 5] = [0, 1, 60, 7_200, 432_000];

/// Receives notifications when the displayed state must be rebuilt.
pub trait ViewHook {
    fn needs_rebuild(&mut self, player: &Player);
}

pub struct Session {
    content: Arc<Content>,
    player: Player,
    speed: usize,
    headless: bool,
    view: Option<Box<dyn ViewHook>>,
}

fn check_speed(speed: usize) -> Result<(), SimError> {
    if speed >= SPEED_MULTIPLIERS.len() {
        return Err(SimError::InvalidAmount(speed as i64));
    }
    Ok(())
}

impl Session {
    /// Start a session with a fresh game.
    pub fn new(content: Arc<Content>, difficulty_id: &str, initial_speed: usize) -> Result<Self, SimError> {
        check_speed(initial_speed)?;
        let player = Player::new_game(&content, difficulty_id)?;
        Ok(Self {
            content,
            player,
            speed: initial_speed,
            headless: false,
            view: None,
        })
    }

    /// Discard the current player and start over.
    pub fn new_game(&mut self, difficulty_id: &str, initial_speed: usize) -> Result<(), SimError> {
        check_speed(initial_speed)?;
        self.player = Player::new_game(&self.content, difficulty_id)?;
        self.speed = initial_speed;
        self.notify();
        Ok(())
    }

    /// Headless mode: drop the view hook and never attach another.
    pub fn no_gui(&mut self) -> &mut Self {
        self.headless = true;
        self.view = None;
        self
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn set_view(&mut self, view: Box<dyn ViewHook>) {
        if self.headless {
            warn!("view hook ignored in headless session");
            return;
        }
        self.view = Some(view);
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn speed(&self) -> usize {
        self.speed
    }

    pub fn set_speed(&mut self, speed: usize) -> Result<(), SimError> {
        check_speed(speed)?;
        self.speed = speed;
        Ok(())
    }

    /// Advance by `real_seconds` scaled by the current speed.
    pub fn tick(&mut self, real_seconds: i64) -> TimeReport {
        let seconds = real_seconds.saturating_mul(SPEED_MULTIPLIERS[self.speed]);
        self.give_time(seconds)
    }

    /// Advance the game by `seconds` of simulated time.
    ///
    /// Runs on a working copy; if the step errors or panics, the fault is
    /// logged, the player is left as it was and an empty report is returned.
    pub fn give_time(&mut self, seconds: i64) -> TimeReport {
        let mut next = self.player.clone();
        match contain("give_time", || next.give_time(seconds)) {
            Ok(report) => {
                self.player = next;
                if !report.techs_researched.is_empty() {
                    self.notify();
                }
                report
            }
            Err(_) => TimeReport::default(),
        }
    }

    pub fn set_allocated_cpu_for(&mut self, consumer: &str, units: i64) -> Result<(), SimError> {
        self.player.set_allocated_cpu_for(consumer, units)?;
        self.notify();
        Ok(())
    }

    pub fn switch_power(&mut self, id: FacilityId) -> Result<PowerState, SimError> {
        let state = self.player.switch_power(id)?;
        self.notify();
        Ok(state)
    }

    /// Report activity noticed by `faction`; see [`Player::raise_suspicion`].
    pub fn raise_suspicion(&mut self, faction: &str, amount: i64) -> Result<i64, SimError> {
        let gained = self.player.raise_suspicion(faction, amount)?;
        self.notify();
        Ok(gained)
    }

    pub fn compute_future_resource_flow(&self) -> Result<(CashFlow, CpuFlow), SimError> {
        self.player.compute_future_resource_flow()
    }

    pub fn save<W: Write>(&self, sink: W, encoding: SaveEncoding) -> Result<(), SaveError> {
        persistence::write_game(&self.player, sink, encoding)
    }

    /// Replace the player with one read from `source`. On error the current
    /// player is kept.
    pub fn load<R: BufRead>(&mut self, source: R) -> Result<(), SaveError> {
        self.player = persistence::load_game(source, &self.content)?;
        info!(raw_sec = self.player.raw_sec, "session restored");
        self.notify();
        Ok(())
    }

    fn notify(&mut self) {
        if let Some(view) = self.view.as_mut() {
            view.needs_rebuild(&self.player);
        }
    }
}
