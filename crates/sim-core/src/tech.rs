//! Research progress for one technology.

use crate::content::{TechId, TechSpec};
use crate::ledger::{Cost, Ledger, ResourceKind};
use crate::{SimError, BASIS};
use std::sync::Arc;

/// Progress of one technology: the immutable spec plus a ledger.
///
/// `done` latches the first time the ledger settles and never clears.
#[derive(Clone, Debug, PartialEq)]
pub struct TechProgress {
    pub spec: Arc<TechSpec>,
    ledger: Ledger,
    done: bool,
}

impl TechProgress {
    /// Start research bookkeeping with labor scaled by `labor_bonus`
    /// (basis points).
    pub fn new(spec: Arc<TechSpec>, labor_bonus: i64) -> Result<Self, SimError> {
        let labor = scaled_labor(spec.cost.labor, labor_bonus);
        let total = Cost::new(spec.cost.cpu, spec.cost.cash, labor);
        let ledger = Ledger::new(total)?;
        let done = ledger.is_settled();
        Ok(Self { spec, ledger, done })
    }

    /// Rebuild from saved state.
    pub fn restore(spec: Arc<TechSpec>, ledger: Ledger, done: bool) -> Self {
        Self { spec, ledger, done }
    }

    pub fn id(&self) -> &TechId {
        &self.spec.id
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn total_cost(&self) -> Cost {
        self.ledger.total_cost()
    }

    pub fn cost_paid(&self) -> Cost {
        self.ledger.cost_paid()
    }

    pub fn cost_left(&self) -> Cost {
        self.ledger.cost_left()
    }

    /// Recompute the labor owed for a new `labor_bonus`. Finished
    /// technologies keep their ledger.
    pub fn rescale_labor(&mut self, labor_bonus: i64) -> Result<(), SimError> {
        if self.done {
            return Ok(());
        }
        let labor = scaled_labor(self.spec.cost.labor, labor_bonus);
        self.ledger.retotal(ResourceKind::Labor, labor)
    }

    /// Spend up to `cpu` cpu-seconds. Returns the cpu actually absorbed.
    pub fn advance_cpu(&mut self, cpu: i64) -> Result<i64, SimError> {
        if self.done {
            return Ok(0);
        }
        self.ledger.advance(ResourceKind::Cpu, cpu)
    }

    /// Pay the cash and labor due for the cpu spent so far, with cash
    /// limited to `cash_available`. Returns the cash paid and whether this
    /// call completed the technology.
    pub fn settle(&mut self, cash_available: i64) -> Result<(i64, bool), SimError> {
        if self.done {
            return Ok((0, false));
        }
        let cash_due = self.ledger.due_with_cpu(ResourceKind::Cash);
        let cash_used = self
            .ledger
            .advance(ResourceKind::Cash, cash_due.min(cash_available.max(0)))?;
        let labor_due = self.ledger.due_with_cpu(ResourceKind::Labor);
        self.ledger.advance(ResourceKind::Labor, labor_due)?;
        let finished = self.ledger.is_settled();
        if finished {
            self.done = true;
        }
        Ok((cash_used, finished))
    }

    /// [`advance_cpu`](Self::advance_cpu) followed by
    /// [`settle`](Self::settle).
    pub fn work_on(&mut self, cpu: i64, cash_available: i64) -> Result<WorkOutcome, SimError> {
        if self.done {
            return Ok(WorkOutcome::default());
        }
        let cpu_used = self.advance_cpu(cpu)?;
        let (cash_used, finished) = self.settle(cash_available)?;
        Ok(WorkOutcome {
            cpu_used,
            cash_used,
            finished,
        })
    }
}

fn scaled_labor(labor: i64, labor_bonus: i64) -> i64 {
    (i128::from(labor) * i128::from(labor_bonus.max(0)) / i128::from(BASIS)) as i64
}

/// What one call to [`TechProgress::work_on`] consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkOutcome {
    pub cpu_used: i64,
    pub cash_used: i64,
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(cpu: i64, cash: i64, labor: i64) -> Arc<TechSpec> {
        Arc::new(TechSpec {
            id: TechId("Stealth".into()),
            cost: Cost::new(cpu, cash, labor),
            prerequisites: vec![],
            effects: vec![],
        })
    }

    #[test]
    fn completes_when_cpu_and_cash_paid() {
        let mut t = TechProgress::new(spec(100, 50, 0), 10_000).unwrap();
        let w = t.work_on(60, 1_000).unwrap();
        assert_eq!(w.cpu_used, 60);
        assert_eq!(w.cash_used, 30);
        assert!(!w.finished);
        let w = t.work_on(60, 1_000).unwrap();
        assert_eq!(w.cpu_used, 40);
        assert!(w.finished);
        assert!(t.done());
        // done is terminal
        assert_eq!(t.work_on(60, 1_000).unwrap(), WorkOutcome::default());
    }

    #[test]
    fn cash_starvation_defers_completion() {
        let mut t = TechProgress::new(spec(100, 50, 0), 10_000).unwrap();
        let w = t.work_on(100, 10).unwrap();
        assert_eq!(t.cost_left().cpu, 0);
        assert_eq!(w.cash_used, 10);
        assert!(!t.done());
        let w = t.work_on(0, 100).unwrap();
        assert_eq!(w.cash_used, 40);
        assert!(w.finished);
    }

    #[test]
    fn labor_scaled_by_bonus() {
        let t = TechProgress::new(spec(100, 0, 1_000), 5_000).unwrap();
        assert_eq!(t.total_cost().labor, 500);
    }

    #[test]
    fn labor_rescaled_for_unfinished_tech() {
        let mut t = TechProgress::new(spec(100, 0, 1_000), 10_000).unwrap();
        t.work_on(50, 0).unwrap();
        assert_eq!(t.cost_paid().labor, 500);
        t.rescale_labor(7_500).unwrap();
        assert_eq!(t.total_cost().labor, 750);
        assert_eq!(t.cost_left().labor, 250);
        t.rescale_labor(10_000).unwrap();
        assert_eq!(t.total_cost().labor, 1_000);
        assert!(t.work_on(50, 0).unwrap().finished);
        t.rescale_labor(5_000).unwrap();
        assert_eq!(t.total_cost().labor, 1_000);
    }

    #[test]
    fn free_tech_is_done_immediately() {
        let t = TechProgress::new(spec(0, 0, 0), 10_000).unwrap();
        assert!(t.done());
    }
}
