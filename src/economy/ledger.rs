//! Resource ledger - session-level resource counters
//!
//! One ledger exists per game session. Anything that collects, produces or
//! spends resources borrows it mutably for the duration of the mutation.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::economy::resource::ResourceType;

/// Non-negative counters for every resource kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceLedger {
    balances: AHashMap<ResourceType, u32>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with starting balances
    pub fn with_balances(balances: &[(ResourceType, u32)]) -> Self {
        let mut ledger = Self::new();
        for (resource, amount) in balances {
            ledger.add(*resource, *amount);
        }
        ledger
    }

    /// Get current amount of a resource
    pub fn get(&self, resource: ResourceType) -> u32 {
        self.balances.get(&resource).copied().unwrap_or(0)
    }

    /// Add resources. Saturates at `u32::MAX`.
    pub fn add(&mut self, resource: ResourceType, amount: u32) {
        if amount == 0 {
            return;
        }
        let entry = self.balances.entry(resource).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Remove resources, clamped at zero. Returns amount actually removed.
    pub fn remove(&mut self, resource: ResourceType, amount: u32) -> u32 {
        match self.balances.get_mut(&resource) {
            Some(current) => {
                let removed = amount.min(*current);
                *current -= removed;
                if removed < amount {
                    tracing::debug!(
                        "Clamped removal of {} {}: only {} available",
                        amount,
                        resource,
                        removed
                    );
                }
                removed
            }
            None => 0,
        }
    }

    /// Name-keyed query; unknown names read as zero
    pub fn get_by_name(&self, name: &str) -> u32 {
        ResourceType::from_name(name)
            .map(|r| self.get(r))
            .unwrap_or(0)
    }

    /// Name-keyed add; unknown names are ignored
    pub fn add_by_name(&mut self, name: &str, amount: u32) {
        if let Some(resource) = ResourceType::from_name(name) {
            self.add(resource, amount);
        }
    }

    /// Name-keyed remove; unknown names remove nothing
    pub fn remove_by_name(&mut self, name: &str, amount: u32) -> u32 {
        ResourceType::from_name(name)
            .map(|r| self.remove(r, amount))
            .unwrap_or(0)
    }

    /// Check if the ledger holds enough of every listed resource.
    ///
    /// Repeated entries for one resource are summed.
    pub fn can_afford(&self, cost: &[(ResourceType, u32)]) -> bool {
        let mut needed: AHashMap<ResourceType, u64> = AHashMap::new();
        for (resource, amount) in cost {
            *needed.entry(*resource).or_insert(0) += *amount as u64;
        }
        needed
            .iter()
            .all(|(resource, amount)| self.get(*resource) as u64 >= *amount)
    }

    /// Remove a whole cost vector, or nothing at all if it is not affordable
    pub fn try_spend(&mut self, cost: &[(ResourceType, u32)]) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for (resource, amount) in cost {
            self.remove(*resource, *amount);
        }
        true
    }

    /// Sum of every counter
    pub fn total(&self) -> u64 {
        self.balances.values().map(|v| *v as u64).sum()
    }

    /// Non-zero balances in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, u32)> + '_ {
        ResourceType::ALL
            .into_iter()
            .map(|r| (r, self.get(r)))
            .filter(|(_, amount)| *amount > 0)
    }
}

impl PartialEq for ResourceLedger {
    fn eq(&self, other: &Self) -> bool {
        ResourceType::ALL
            .into_iter()
            .all(|r| self.get(r) == other.get(r))
    }
}
