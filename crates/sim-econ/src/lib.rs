#![deny(warnings)]

//! Economic rules for the CPU economy: job pay, interest, suspicion decay,
//! the time advancer and the one-day forecast.
//!
//! The free functions here are pure; [`Economy`] attaches the stateful
//! operations to [`sim_core::Player`].

pub mod clock;
pub mod forecast;

pub use clock::{give_time, TimeReport};
pub use forecast::{compute_future_resource_flow, CashFlow, CpuFlow};

use sim_core::{Player, SimError, BASIS, SECONDS_PER_DAY};

/// Cash per CPU-day of jobs after applying `job_bonus` (basis points).
pub fn job_rate(cash_per_cpu: i64, job_bonus: i64) -> i64 {
    let scaled = i128::from(cash_per_cpu) * i128::from(job_bonus) / i128::from(BASIS);
    (scaled as i64).max(0)
}

/// Pay `cpu_seconds` of jobs at `rate` on top of `partial_cash`.
///
/// Returns `(whole cash earned, new partial cash)`; the partial part stays
/// below one day's worth of cash-seconds, so nothing is lost between calls.
///
/// ```
/// let (earned, partial) = sim_econ::job_pay(0, 5, 43_200);
/// assert_eq!((earned, partial), (2, 43_200));
/// ```
pub fn job_pay(partial_cash: i64, rate: i64, cpu_seconds: i64) -> (i64, i64) {
    let raw = i128::from(partial_cash) + i128::from(rate) * i128::from(cpu_seconds);
    let day = i128::from(SECONDS_PER_DAY);
    ((raw / day) as i64, (raw % day) as i64)
}

/// Interest credited at midnight. Debt earns nothing.
pub fn daily_interest(cash: i64, interest_rate: i64) -> i64 {
    if cash <= 0 {
        return 0;
    }
    (i128::from(cash) * i128::from(interest_rate) / i128::from(BASIS)) as i64
}

/// Suspicion after one day of decay, never below zero.
pub fn decayed_suspicion(suspicion: i64, decay: i64) -> i64 {
    let drop = i128::from(suspicion) * i128::from(decay) / i128::from(BASIS);
    (suspicion - drop as i64).max(0)
}

/// Time and forecasting operations on a player.
pub trait Economy {
    /// Advance simulated time by `seconds`.
    fn give_time(&mut self, seconds: i64) -> Result<TimeReport, SimError>;
    /// Estimate the next day's cash and CPU flow without mutating state.
    fn compute_future_resource_flow(&self) -> Result<(CashFlow, CpuFlow), SimError>;
}

impl Economy for Player {
    fn give_time(&mut self, seconds: i64) -> Result<TimeReport, SimError> {
        clock::give_time(self, seconds)
    }

    fn compute_future_resource_flow(&self) -> Result<(CashFlow, CpuFlow), SimError> {
        forecast::compute_future_resource_flow(self)
    }
}
