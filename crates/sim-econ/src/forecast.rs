//! One-day forecast of cash and CPU flow, for player-facing estimates.

use crate::clock::give_time;
use serde::Serialize;
use sim_core::{Player, SimError, TechId, SECONDS_PER_DAY};
use std::collections::BTreeMap;

/// Cash expected over the next day, itemised by source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CashFlow {
    pub jobs: i64,
    pub income: i64,
    pub interest: i64,
    /// Cash paid towards research (an outflow).
    pub research: i64,
    /// Net change in cash.
    pub total: i64,
}

/// CPU-seconds expected to be spent over the next day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CpuFlow {
    pub jobs: i64,
    pub research: BTreeMap<TechId, i64>,
    pub total: i64,
}

/// Run one day on a copy of `player` and report what it earned and spent.
pub fn compute_future_resource_flow(player: &Player) -> Result<(CashFlow, CpuFlow), SimError> {
    let _span = tracing::debug_span!("forecast").entered();
    let mut shadow = player.clone();
    let report = give_time(&mut shadow, SECONDS_PER_DAY)?;
    let cash = CashFlow {
        jobs: report.jobs_cash,
        income: report.income_cash,
        interest: report.interest_cash,
        research: report.research_cash,
        total: shadow.cash - player.cash,
    };
    let cpu = CpuFlow {
        jobs: report.jobs_cpu,
        total: report.jobs_cpu + report.research_cpu.values().sum::<i64>(),
        research: report.research_cpu,
    };
    Ok((cash, cpu))
}
