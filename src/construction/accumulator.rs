//! Cost accumulator - remaining build cost of a module under construction
//!
//! The player funds a placed module a little at a time. Each spend moves
//! resources out of the ledger and off the remaining cost; the call that
//! brings the remaining cost to zero reports completion, and no later call
//! does.

use serde::{Deserialize, Serialize};

use crate::economy::{ResourceLedger, ResourceType};

/// Result of a spend action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendReceipt {
    /// Units actually moved out of the ledger (may be less than requested)
    pub spent: u32,
    /// True only on the call that completed the cost
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAccumulator {
    remaining: Vec<(ResourceType, u32)>,
    initial_total: u64,
    fired: bool,
}

impl CostAccumulator {
    pub fn new(cost: &[(ResourceType, u32)]) -> Self {
        let mut accumulator = Self::default();
        accumulator.bind(cost);
        accumulator
    }

    /// Reset to a fresh cost vector. Repeated resources are merged.
    pub fn bind(&mut self, cost: &[(ResourceType, u32)]) {
        let mut remaining: Vec<(ResourceType, u32)> = Vec::with_capacity(cost.len());
        for (resource, amount) in cost {
            match remaining.iter_mut().find(|(r, _)| r == resource) {
                Some(entry) => entry.1 = entry.1.saturating_add(*amount),
                None => remaining.push((*resource, *amount)),
            }
        }
        self.initial_total = remaining.iter().map(|(_, a)| *a as u64).sum();
        self.remaining = remaining;
        self.fired = false;
    }

    /// Spend up to `amount` of `resource` toward the cost.
    ///
    /// The spend is clamped to both the ledger balance and what is still owed.
    pub fn spend(
        &mut self,
        resource: ResourceType,
        amount: u32,
        ledger: &mut ResourceLedger,
    ) -> SpendReceipt {
        let owed = self.remaining(resource);
        let spent = amount.min(ledger.get(resource)).min(owed);
        if spent > 0 {
            ledger.remove(resource, spent);
            if let Some(entry) = self.remaining.iter_mut().find(|(r, _)| *r == resource) {
                entry.1 -= spent;
            }
        }
        SpendReceipt {
            spent,
            completed: self.check_completion(),
        }
    }

    /// Spend as much as the ledger allows on every remaining entry, in order
    pub fn spend_available(&mut self, ledger: &mut ResourceLedger) -> SpendReceipt {
        let mut spent = 0u32;
        let resources: Vec<ResourceType> = self.remaining.iter().map(|(r, _)| *r).collect();
        for resource in resources {
            let owed = self.remaining(resource);
            let take = owed.min(ledger.get(resource));
            if take > 0 {
                ledger.remove(resource, take);
                if let Some(entry) = self.remaining.iter_mut().find(|(r, _)| *r == resource) {
                    entry.1 -= take;
                }
                spent = spent.saturating_add(take);
            }
        }
        SpendReceipt {
            spent,
            completed: self.check_completion(),
        }
    }

    fn check_completion(&mut self) -> bool {
        if !self.fired && self.is_complete() {
            self.fired = true;
            return true;
        }
        false
    }

    /// Amount of `resource` still owed (0 if it is not part of the cost)
    pub fn remaining(&self, resource: ResourceType) -> u32 {
        self.remaining
            .iter()
            .find(|(r, _)| *r == resource)
            .map(|(_, a)| *a)
            .unwrap_or(0)
    }

    pub fn remaining_entries(&self) -> &[(ResourceType, u32)] {
        &self.remaining
    }

    pub fn remaining_total(&self) -> u64 {
        self.remaining.iter().map(|(_, a)| *a as u64).sum()
    }

    pub fn initial_total(&self) -> u64 {
        self.initial_total
    }

    /// 0.0 when nothing is paid, 1.0 when fully paid (or the cost was zero)
    pub fn progress_fraction(&self) -> f32 {
        if self.initial_total == 0 {
            return 1.0;
        }
        let fraction = 1.0 - self.remaining_total() as f64 / self.initial_total as f64;
        fraction.clamp(0.0, 1.0) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_total() == 0
    }

    /// Whether the completion signal has already been reported
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cost() -> Vec<(ResourceType, u32)> {
        vec![(ResourceType::Tritium, 10), (ResourceType::Silver, 5)]
    }

    #[test]
    fn test_bind_caches_total() {
        let acc = CostAccumulator::new(&cost());
        assert_eq!(acc.initial_total(), 15);
        assert_eq!(acc.remaining(ResourceType::Tritium), 10);
        assert_eq!(acc.remaining(ResourceType::Energy), 0);
        assert_eq!(acc.progress_fraction(), 0.0);
        assert!(!acc.is_complete());
    }

    #[test]
    fn test_bind_merges_duplicates() {
        let acc = CostAccumulator::new(&[
            (ResourceType::Silver, 2),
            (ResourceType::Tritium, 1),
            (ResourceType::Silver, 3),
        ]);
        assert_eq!(
            acc.remaining_entries(),
            &[(ResourceType::Silver, 5), (ResourceType::Tritium, 1)]
        );
    }

    #[test]
    fn test_spend_clamped_by_ledger_and_remaining() {
        let mut acc = CostAccumulator::new(&cost());
        let mut ledger = ResourceLedger::with_balances(&[
            (ResourceType::Tritium, 4),
            (ResourceType::Silver, 50),
        ]);

        // Ledger only has 4
        let receipt = acc.spend(ResourceType::Tritium, 8, &mut ledger);
        assert_eq!(receipt.spent, 4);
        assert!(!receipt.completed);
        assert_eq!(ledger.get(ResourceType::Tritium), 0);
        assert_eq!(acc.remaining(ResourceType::Tritium), 6);

        // Only 5 owed
        let receipt = acc.spend(ResourceType::Silver, 20, &mut ledger);
        assert_eq!(receipt.spent, 5);
        assert_eq!(ledger.get(ResourceType::Silver), 45);
        assert_eq!(acc.remaining(ResourceType::Silver), 0);
    }

    #[test]
    fn test_spend_on_unrelated_resource_is_noop() {
        let mut acc = CostAccumulator::new(&cost());
        let mut ledger = ResourceLedger::with_balances(&[(ResourceType::Energy, 10)]);
        let receipt = acc.spend(ResourceType::Energy, 10, &mut ledger);
        assert_eq!(receipt, SpendReceipt::default());
        assert_eq!(ledger.get(ResourceType::Energy), 10);
    }

    #[test]
    fn test_completion_fires_once() {
        let mut acc = CostAccumulator::new(&cost());
        let mut ledger = ResourceLedger::with_balances(&[
            (ResourceType::Tritium, 100),
            (ResourceType::Silver, 100),
        ]);

        assert!(!acc.spend(ResourceType::Silver, 5, &mut ledger).completed);
        assert!(!acc.spend(ResourceType::Tritium, 3, &mut ledger).completed);
        let receipt = acc.spend(ResourceType::Tritium, 7, &mut ledger);
        assert_eq!(receipt.spent, 7);
        assert!(receipt.completed);
        assert!(acc.is_complete());
        assert_eq!(acc.progress_fraction(), 1.0);

        // Further spends change nothing and never re-fire
        let receipt = acc.spend(ResourceType::Tritium, 7, &mut ledger);
        assert_eq!(receipt, SpendReceipt::default());
        assert_eq!(ledger.get(ResourceType::Tritium), 90);
        assert!(acc.has_fired());
    }

    #[test]
    fn test_progress_fraction() {
        let mut acc = CostAccumulator::new(&[(ResourceType::Energy, 4)]);
        let mut ledger = ResourceLedger::with_balances(&[(ResourceType::Energy, 10)]);
        acc.spend(ResourceType::Energy, 1, &mut ledger);
        assert!((acc.progress_fraction() - 0.25).abs() < 1e-6);
        acc.spend(ResourceType::Energy, 2, &mut ledger);
        assert!((acc.progress_fraction() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_zero_cost_completes_on_first_spend() {
        let mut acc = CostAccumulator::new(&[]);
        let mut ledger = ResourceLedger::new();
        assert!(acc.is_complete());
        assert_eq!(acc.progress_fraction(), 1.0);

        assert!(acc.spend(ResourceType::Tritium, 0, &mut ledger).completed);
        assert!(!acc.spend(ResourceType::Tritium, 0, &mut ledger).completed);
    }

    #[test]
    fn test_spend_available() {
        let mut acc = CostAccumulator::new(&cost());
        let mut ledger = ResourceLedger::with_balances(&[
            (ResourceType::Tritium, 6),
            (ResourceType::Silver, 9),
        ]);

        let receipt = acc.spend_available(&mut ledger);
        assert_eq!(receipt.spent, 11);
        assert!(!receipt.completed);
        assert_eq!(acc.remaining(ResourceType::Tritium), 4);
        assert_eq!(acc.remaining(ResourceType::Silver), 0);
        assert_eq!(ledger.get(ResourceType::Silver), 4);

        ledger.add(ResourceType::Tritium, 4);
        let receipt = acc.spend_available(&mut ledger);
        assert_eq!(receipt.spent, 4);
        assert!(receipt.completed);
    }

    #[test]
    fn test_rebind_resets_signal() {
        let mut acc = CostAccumulator::new(&[(ResourceType::Silver, 1)]);
        let mut ledger = ResourceLedger::with_balances(&[(ResourceType::Silver, 2)]);
        assert!(acc.spend(ResourceType::Silver, 1, &mut ledger).completed);

        acc.bind(&[(ResourceType::Silver, 1)]);
        assert!(!acc.has_fired());
        assert!(acc.spend(ResourceType::Silver, 1, &mut ledger).completed);
    }
}
