//! Time advancer: the single step function that moves a player forward.
//!
//! Elapsed time is processed in segments that never cross midnight, and
//! segments are cut again wherever a technology completes, so the outcome
//! does not depend on how the caller slices the interval.

use crate::{daily_interest, decayed_suspicion, job_pay, job_rate};
use serde::Serialize;
use sim_core::{Player, SimError, TechId, TechProgress, CPU_POOL, JOBS, SECONDS_PER_DAY};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// What one call to [`give_time`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimeReport {
    pub seconds: i64,
    /// Midnights crossed.
    pub days_passed: i64,
    pub jobs_cash: i64,
    pub income_cash: i64,
    pub interest_cash: i64,
    /// Cash paid towards research.
    pub research_cash: i64,
    /// CPU-seconds that worked jobs.
    pub jobs_cpu: i64,
    /// CPU-seconds absorbed by each technology.
    pub research_cpu: BTreeMap<TechId, i64>,
    pub techs_researched: Vec<TechId>,
}

/// Advance `player` by `seconds` of simulated time.
///
/// Zero seconds is a no-op. Negative seconds fail with `InvalidAmount`.
pub fn give_time(player: &mut Player, seconds: i64) -> Result<TimeReport, SimError> {
    if seconds < 0 {
        return Err(SimError::InvalidAmount(seconds));
    }
    let mut report = TimeReport {
        seconds,
        ..TimeReport::default()
    };
    if seconds == 0 {
        return Ok(report);
    }
    let mut remaining = seconds;
    while remaining > 0 {
        let into_day = player.raw_sec.rem_euclid(SECONDS_PER_DAY);
        let step = remaining.min(SECONDS_PER_DAY - into_day);
        run_segment(player, step, &mut report)?;
        remaining -= step;
        if player.raw_sec.rem_euclid(SECONDS_PER_DAY) == 0 {
            midnight(player, &mut report);
        }
    }
    Ok(report)
}

/// Spend `step` seconds, cut at every second a technology completes so its
/// effects apply from that second on.
fn run_segment(player: &mut Player, step: i64, report: &mut TimeReport) -> Result<(), SimError> {
    let mut left = step;
    while left > 0 {
        let dt = until_next_completion(player, left)?;
        let finished = work(player, dt, report)?;
        player.raw_sec += dt;
        trace!(seconds = dt, finished = finished.len(), "segment");
        for id in finished {
            player.finish_research(&id)?;
            report.techs_researched.push(id);
        }
        left -= dt;
    }
    Ok(())
}

fn researching(player: &Player) -> impl Iterator<Item = (TechId, i64)> + '_ {
    player
        .allocations()
        .filter(|(id, _)| *id != JOBS && *id != CPU_POOL)
        .map(|(id, units)| (TechId(id.to_string()), units))
}

/// Length of the shortest stretch, at most `limit` seconds, after which
/// some technology completes; `limit` when none does.
fn until_next_completion(player: &Player, limit: i64) -> Result<i64, SimError> {
    let pending = researching(player).any(|(id, _)| player.techs.get(&id).is_some_and(|t| !t.done()));
    if !pending {
        return Ok(limit);
    }
    let completes = |dt: i64| -> Result<bool, SimError> {
        let mut shadow = player.clone();
        Ok(!work(&mut shadow, dt, &mut TimeReport::default())?.is_empty())
    };
    if !completes(limit)? {
        return Ok(limit);
    }
    let (mut lo, mut hi) = (1, limit);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if completes(mid)? {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

fn tech_mut<'a>(player: &'a mut Player, id: &TechId) -> Result<&'a mut TechProgress, SimError> {
    player
        .techs
        .get_mut(id)
        .ok_or_else(|| SimError::UnknownConsumer(id.0.clone()))
}

/// Run `dt` seconds at the current rates: cpu to research, the rest to
/// jobs, then research cash and labor. Returns the technologies completed.
fn work(player: &mut Player, dt: i64, report: &mut TimeReport) -> Result<Vec<TechId>, SimError> {
    let research: Vec<(TechId, i64)> = researching(player).collect();
    let mut job_cpu = (player.effective_cpu_pool() + player.get_allocated_cpu_for(JOBS)) * dt;
    for (id, units) in &research {
        let cpu = units * dt;
        let used = tech_mut(player, id)?.advance_cpu(cpu)?;
        job_cpu += cpu - used;
        *report.research_cpu.entry(id.clone()).or_insert(0) += used;
    }

    // Job income first; research cash may draw on it.
    let rate = job_rate(player.difficulty.job_cash_per_cpu, player.job_bonus);
    let (earned, partial) = job_pay(player.partial_cash, rate, job_cpu);
    player.cash += earned;
    player.partial_cash = partial;
    report.jobs_cash += earned;
    report.jobs_cpu += job_cpu;

    let mut finished = Vec::new();
    for (id, _) in research {
        let cash_available = player.cash;
        let (cash_used, done) = tech_mut(player, &id)?.settle(cash_available)?;
        player.cash -= cash_used;
        report.research_cash += cash_used;
        if done {
            finished.push(id);
        }
    }
    Ok(finished)
}

fn midnight(player: &mut Player, report: &mut TimeReport) {
    report.days_passed += 1;
    player.cash += player.income;
    report.income_cash += player.income;
    let interest = daily_interest(player.cash, player.interest_rate);
    player.cash += interest;
    report.interest_cash += interest;
    for group in player.groups.values_mut() {
        group.suspicion = decayed_suspicion(group.suspicion, group.suspicion_decay);
    }
    player.record_loss();
    debug!(
        day = player.raw_sec / SECONDS_PER_DAY,
        cash = player.cash,
        "midnight"
    );
}
