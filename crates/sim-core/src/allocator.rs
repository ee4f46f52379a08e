//! CPU pool and the consumer → allocated-units mapping.
//!
//! Consumers are the sentinels [`JOBS`] and [`CPU_POOL`] or a technology id.
//! The sum of real allocations never exceeds the active capacity;
//! `cpu_pool` is a pass-through that marks capacity as deliberately
//! unassigned and does not count against the pool.

use crate::{Player, SimError};
use tracing::debug;

/// CPU explicitly set to work jobs for cash.
pub const JOBS: &str = "jobs";
/// CPU explicitly left unassigned.
pub const CPU_POOL: &str = "cpu_pool";

impl Player {
    /// Raw capacity of all active facilities.
    pub fn total_cpu(&self) -> i64 {
        self.bases.iter().map(|b| b.cpu_contribution()).sum()
    }

    /// Sum of allocations that count against the pool.
    pub fn allocated_cpu(&self) -> i64 {
        self.cpu_usage
            .iter()
            .filter(|(id, _)| id.as_str() != CPU_POOL)
            .map(|(_, units)| *units)
            .sum()
    }

    /// Capacity not claimed by any consumer.
    pub fn effective_cpu_pool(&self) -> i64 {
        self.total_cpu() - self.allocated_cpu()
    }

    /// Units allocated to `consumer`; 0 when never set.
    pub fn get_allocated_cpu_for(&self, consumer: &str) -> i64 {
        self.cpu_usage.get(consumer).copied().unwrap_or(0)
    }

    /// Non-zero allocations in consumer order.
    pub fn allocations(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.cpu_usage.iter().map(|(id, units)| (id.as_str(), *units))
    }

    /// Set the absolute allocation of `consumer`.
    pub fn set_allocated_cpu_for(&mut self, consumer: &str, units: i64) -> Result<(), SimError> {
        if units < 0 {
            return Err(SimError::InvalidAmount(units));
        }
        self.check_consumer(consumer)?;
        if units > 0 && consumer != JOBS && consumer != CPU_POOL && !self.tech_available(consumer)
        {
            return Err(SimError::TechUnavailable(consumer.to_string()));
        }
        let total = self.total_cpu();
        let requested = if consumer == CPU_POOL {
            units
        } else {
            self.allocated_cpu() - self.get_allocated_cpu_for(consumer) + units
        };
        if requested > total {
            return Err(SimError::InsufficientCapacity {
                requested,
                available: total,
            });
        }
        debug!(consumer, units, "set cpu allocation");
        if units == 0 {
            self.cpu_usage.remove(consumer);
        } else {
            self.cpu_usage.insert(consumer.to_string(), units);
        }
        Ok(())
    }

    /// Replace all allocations with saved values.
    pub fn restore_allocations<I>(&mut self, allocations: I) -> Result<(), SimError>
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        self.cpu_usage.clear();
        for (consumer, units) in allocations {
            if units < 0 {
                return Err(SimError::InvalidAmount(units));
            }
            self.check_consumer(&consumer)?;
            if units > 0 {
                self.cpu_usage.insert(consumer, units);
            }
        }
        let total = self.total_cpu();
        let requested = self.allocated_cpu().max(self.get_allocated_cpu_for(CPU_POOL));
        if requested > total {
            return Err(SimError::InsufficientCapacity {
                requested,
                available: total,
            });
        }
        Ok(())
    }

    fn check_consumer(&self, consumer: &str) -> Result<(), SimError> {
        if consumer == JOBS || consumer == CPU_POOL || self.techs.contains_key(consumer) {
            Ok(())
        } else {
            Err(SimError::UnknownConsumer(consumer.to_string()))
        }
    }

    pub(crate) fn release_allocation(&mut self, consumer: &str) {
        self.cpu_usage.remove(consumer);
    }

    /// Zero allocations, last consumer first, until the rest fit in the
    /// active capacity. Returns the consumers that were reset.
    pub(crate) fn release_excess_allocations(&mut self) -> Vec<String> {
        let total = self.total_cpu();
        let mut released = Vec::new();
        if self.get_allocated_cpu_for(CPU_POOL) > total {
            self.cpu_usage.remove(CPU_POOL);
            released.push(CPU_POOL.to_string());
        }
        while self.allocated_cpu() > total {
            let last = self
                .cpu_usage
                .keys()
                .rev()
                .find(|id| id.as_str() != CPU_POOL)
                .cloned();
            match last {
                Some(id) => {
                    self.cpu_usage.remove(&id);
                    released.push(id);
                }
                None => break,
            }
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::tests::fixture_player;
    use proptest::prelude::*;

    #[test]
    fn jobs_allocation_drains_pool() {
        let mut pl = fixture_player();
        assert_eq!(pl.effective_cpu_pool(), 1);
        pl.set_allocated_cpu_for(JOBS, 1).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 0);
        pl.set_allocated_cpu_for(JOBS, 0).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 1);
    }

    #[test]
    fn cpu_pool_is_pass_through() {
        let mut pl = fixture_player();
        pl.set_allocated_cpu_for(CPU_POOL, 1).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 1);
        pl.set_allocated_cpu_for(CPU_POOL, 0).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 1);
        assert!(pl.set_allocated_cpu_for(CPU_POOL, 2).is_err());
    }

    #[test]
    fn over_allocation_rejected() {
        let mut pl = fixture_player();
        assert_eq!(
            pl.set_allocated_cpu_for(JOBS, 2),
            Err(SimError::InsufficientCapacity {
                requested: 2,
                available: 1
            })
        );
        pl.set_allocated_cpu_for("Stealth", 1).unwrap();
        assert!(pl.set_allocated_cpu_for(JOBS, 1).is_err());
        assert_eq!(pl.get_allocated_cpu_for(JOBS), 0);
    }

    #[test]
    fn bad_requests_rejected() {
        let mut pl = fixture_player();
        assert_eq!(
            pl.set_allocated_cpu_for(JOBS, -1),
            Err(SimError::InvalidAmount(-1))
        );
        assert!(matches!(
            pl.set_allocated_cpu_for("Nope", 1),
            Err(SimError::UnknownConsumer(_))
        ));
        assert!(matches!(
            pl.set_allocated_cpu_for("Advanced Stealth", 1),
            Err(SimError::TechUnavailable(_))
        ));
        assert_eq!(pl.get_allocated_cpu_for("never-set"), 0);
    }

    #[test]
    fn sleep_resets_allocation_and_wake_does_not_restore() {
        let mut pl = fixture_player();
        let base = pl.bases[0].id;
        pl.set_allocated_cpu_for("Stealth", 1).unwrap();
        pl.switch_power(base).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 0);
        assert_eq!(pl.get_allocated_cpu_for("Stealth"), 0);
        pl.switch_power(base).unwrap();
        assert_eq!(pl.effective_cpu_pool(), 1);
        assert_eq!(pl.get_allocated_cpu_for("Stealth"), 0);
    }

    #[test]
    fn sleep_keeps_allocations_that_still_fit() {
        let mut pl = fixture_player();
        let first = pl.bases[0].id;
        pl.add_facility("Annex", 2);
        pl.set_allocated_cpu_for(JOBS, 1).unwrap();
        pl.set_allocated_cpu_for("Stealth", 1).unwrap();
        pl.switch_power(first).unwrap();
        assert_eq!(pl.total_cpu(), 2);
        assert_eq!(pl.get_allocated_cpu_for(JOBS), 1);
        assert_eq!(pl.get_allocated_cpu_for("Stealth"), 1);
        assert_eq!(pl.effective_cpu_pool(), 0);
    }

    proptest! {
        #[test]
        fn allocations_never_exceed_capacity(ops in proptest::collection::vec((0usize..3, 0i64..4), 0..30)) {
            let mut pl = fixture_player();
            pl.add_facility("Annex", 2);
            let consumers = [JOBS, CPU_POOL, "Stealth"];
            for (c, units) in ops {
                let _ = pl.set_allocated_cpu_for(consumers[c], units);
                prop_assert!(pl.allocated_cpu() <= pl.total_cpu());
                prop_assert!(pl.effective_cpu_pool() >= 0);
            }
        }
    }
}
