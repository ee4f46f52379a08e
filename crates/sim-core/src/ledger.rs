//! Resource ledger: per-kind cost totals, amounts paid and amounts left for
//! anything that is bought over time (technologies, projects).

use crate::SimError;
use serde::{Deserialize, Serialize};

/// Kinds of resources a progressable item can cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// CPU-seconds.
    Cpu,
    /// Currency units.
    Cash,
    /// Labor-seconds.
    Labor,
}

impl ResourceKind {
    /// All kinds, in ledger order.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Cpu, ResourceKind::Cash, ResourceKind::Labor];
}

/// An amount per resource kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub cpu: i64,
    pub cash: i64,
    pub labor: i64,
}

impl Cost {
    pub const ZERO: Cost = Cost {
        cpu: 0,
        cash: 0,
        labor: 0,
    };

    pub fn new(cpu: i64, cash: i64, labor: i64) -> Self {
        Self { cpu, cash, labor }
    }

    pub fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Cash => self.cash,
            ResourceKind::Labor => self.labor,
        }
    }

    fn get_mut(&mut self, kind: ResourceKind) -> &mut i64 {
        match kind {
            ResourceKind::Cpu => &mut self.cpu,
            ResourceKind::Cash => &mut self.cash,
            ResourceKind::Labor => &mut self.labor,
        }
    }

    /// Returns the first negative component, if any.
    pub fn first_negative(&self) -> Option<i64> {
        ResourceKind::ALL
            .iter()
            .map(|k| self.get(*k))
            .find(|v| *v < 0)
    }
}

/// Progress ledger. Holds `cost_paid[k] + cost_left[k] == total_cost[k]`
/// for every kind at all times.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    total_cost: Cost,
    cost_paid: Cost,
    cost_left: Cost,
}

impl Ledger {
    /// Fresh ledger with nothing paid.
    pub fn new(total_cost: Cost) -> Result<Self, SimError> {
        if let Some(v) = total_cost.first_negative() {
            return Err(SimError::InvalidAmount(v));
        }
        Ok(Self {
            total_cost,
            cost_paid: Cost::ZERO,
            cost_left: total_cost,
        })
    }

    /// Rebuild a ledger from stored parts, checking the conservation invariant.
    pub fn from_parts(total_cost: Cost, cost_paid: Cost, cost_left: Cost) -> Result<Self, SimError> {
        for v in [total_cost, cost_paid, cost_left] {
            if let Some(n) = v.first_negative() {
                return Err(SimError::InvalidAmount(n));
            }
        }
        for kind in ResourceKind::ALL {
            if cost_paid.get(kind) + cost_left.get(kind) != total_cost.get(kind) {
                return Err(SimError::Serialization(format!(
                    "ledger for {kind:?} does not balance: {} + {} != {}",
                    cost_paid.get(kind),
                    cost_left.get(kind),
                    total_cost.get(kind)
                )));
            }
        }
        Ok(Self {
            total_cost,
            cost_paid,
            cost_left,
        })
    }

    pub fn total_cost(&self) -> Cost {
        self.total_cost
    }

    pub fn cost_paid(&self) -> Cost {
        self.cost_paid
    }

    pub fn cost_left(&self) -> Cost {
        self.cost_left
    }

    /// Pay up to `amount` of `kind`, clamped at what is left. Returns the
    /// amount actually applied. Progress is never rolled back.
    pub fn advance(&mut self, kind: ResourceKind, amount: i64) -> Result<i64, SimError> {
        if amount < 0 {
            return Err(SimError::InvalidAmount(amount));
        }
        let left = self.cost_left.get_mut(kind);
        let delta = amount.min(*left);
        *left -= delta;
        *self.cost_paid.get_mut(kind) += delta;
        Ok(delta)
    }

    /// Change the total owed in `kind`, keeping what was already paid. The
    /// total never drops below the paid amount.
    pub fn retotal(&mut self, kind: ResourceKind, total: i64) -> Result<(), SimError> {
        if total < 0 {
            return Err(SimError::InvalidAmount(total));
        }
        let paid = self.cost_paid.get(kind);
        let total = total.max(paid);
        *self.total_cost.get_mut(kind) = total;
        *self.cost_left.get_mut(kind) = total - paid;
        Ok(())
    }

    /// Nothing left to pay in any kind.
    pub fn is_settled(&self) -> bool {
        self.cost_left == Cost::ZERO
    }

    /// Amount of `kind` owed once CPU progress is taken into account.
    ///
    /// Cash and labor are due in proportion to CPU paid so far; a ledger
    /// with no CPU component owes them in full.
    pub fn due_with_cpu(&self, kind: ResourceKind) -> i64 {
        let total = self.total_cost.get(kind);
        let target = if self.total_cost.cpu == 0 {
            total
        } else {
            let scaled = i128::from(total) * i128::from(self.cost_paid.cpu)
                / i128::from(self.total_cost.cpu);
            scaled as i64
        };
        (target - self.cost_paid.get(kind)).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn advance_clamps_at_zero() {
        let mut l = Ledger::new(Cost::new(100, 50, 0)).unwrap();
        assert_eq!(l.advance(ResourceKind::Cpu, 60).unwrap(), 60);
        assert_eq!(l.advance(ResourceKind::Cpu, 60).unwrap(), 40);
        assert_eq!(l.cost_left().cpu, 0);
        assert_eq!(l.cost_paid().cpu, 100);
        assert!(!l.is_settled());
    }

    #[test]
    fn negative_amount_rejected() {
        let mut l = Ledger::new(Cost::new(10, 0, 0)).unwrap();
        assert_eq!(
            l.advance(ResourceKind::Cash, -1),
            Err(SimError::InvalidAmount(-1))
        );
        assert!(Ledger::new(Cost::new(-5, 0, 0)).is_err());
    }

    #[test]
    fn cash_due_tracks_cpu_progress() {
        let mut l = Ledger::new(Cost::new(1000, 300, 0)).unwrap();
        assert_eq!(l.due_with_cpu(ResourceKind::Cash), 0);
        l.advance(ResourceKind::Cpu, 500).unwrap();
        assert_eq!(l.due_with_cpu(ResourceKind::Cash), 150);
        l.advance(ResourceKind::Cash, 100).unwrap();
        assert_eq!(l.due_with_cpu(ResourceKind::Cash), 50);
    }

    #[test]
    fn retotal_keeps_payments() {
        let mut l = Ledger::new(Cost::new(100, 0, 400)).unwrap();
        l.advance(ResourceKind::Labor, 150).unwrap();
        l.retotal(ResourceKind::Labor, 300).unwrap();
        assert_eq!(l.total_cost().labor, 300);
        assert_eq!(l.cost_left().labor, 150);
        l.retotal(ResourceKind::Labor, 100).unwrap();
        assert_eq!(l.total_cost().labor, 150);
        assert_eq!(l.cost_left().labor, 0);
        assert_eq!(l.retotal(ResourceKind::Labor, -1), Err(SimError::InvalidAmount(-1)));
    }

    #[test]
    fn unbalanced_parts_rejected() {
        let err = Ledger::from_parts(Cost::new(10, 0, 0), Cost::new(4, 0, 0), Cost::new(5, 0, 0));
        assert!(matches!(err, Err(SimError::Serialization(_))));
    }

    proptest! {
        #[test]
        fn paid_plus_left_is_total(total in 0i64..1_000_000, steps in proptest::collection::vec(0i64..50_000, 0..40)) {
            let mut l = Ledger::new(Cost::new(total, total / 2, 0)).unwrap();
            for s in steps {
                l.advance(ResourceKind::Cpu, s).unwrap();
                l.advance(ResourceKind::Cash, s / 3).unwrap();
                for k in ResourceKind::ALL {
                    prop_assert_eq!(l.cost_paid().get(k) + l.cost_left().get(k), l.total_cost().get(k));
                    prop_assert!(l.cost_left().get(k) >= 0);
                }
            }
        }
    }
}
