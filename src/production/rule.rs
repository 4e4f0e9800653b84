//! Production rules - declarative resource conversions
//!
//! A `ProductionRule` converts inputs into one output at fixed ratios (the
//! smelter turning ore into refined goods). A `BatchRecipe` is paid for up
//! front and drip-fed out one unit per tick (the reactor and fabricator).

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::economy::{ResourceLedger, ResourceType};

/// Player-chosen amount of each input to feed into a conversion
pub type DesiredAmounts = AHashMap<ResourceType, u32>;

/// One input of a conversion and how many units make one ratio unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInput {
    pub resource: ResourceType,
    pub ratio: u32,
}

/// Outcome of running a rule once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleTick {
    /// Ratio units converted (input consumed = ratio_units * ratio per input)
    pub ratio_units: u32,
    /// Output units added to the ledger
    pub produced: u32,
}

impl RuleTick {
    pub fn is_empty(&self) -> bool {
        self.produced == 0
    }
}

/// A ratio conversion, identified by its output resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    pub output: ResourceType,
    pub inputs: Vec<RuleInput>,
    pub output_per_ratio_unit: u32,
    pub tick_interval_seconds: f32,
}

impl ProductionRule {
    pub fn new(
        output: ResourceType,
        inputs: Vec<RuleInput>,
        output_per_ratio_unit: u32,
        tick_interval_seconds: f32,
    ) -> Self {
        Self {
            output,
            inputs,
            output_per_ratio_unit,
            tick_interval_seconds,
        }
    }

    /// Single-input rule producing one output unit per ratio unit
    pub fn single(
        input: ResourceType,
        ratio: u32,
        output: ResourceType,
        tick_interval_seconds: f32,
    ) -> Self {
        Self::new(
            output,
            vec![RuleInput {
                resource: input,
                ratio,
            }],
            1,
            tick_interval_seconds,
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            return Err(format!("rule for {} has no inputs", self.output.key()));
        }
        for (i, input) in self.inputs.iter().enumerate() {
            if input.ratio == 0 {
                return Err(format!(
                    "rule for {} has zero ratio for {}",
                    self.output.key(),
                    input.resource.key()
                ));
            }
            if self.inputs[..i].iter().any(|r| r.resource == input.resource) {
                return Err(format!(
                    "rule for {} lists {} twice",
                    self.output.key(),
                    input.resource.key()
                ));
            }
        }
        if self.output_per_ratio_unit == 0 {
            return Err(format!(
                "rule for {} produces nothing per ratio unit",
                self.output.key()
            ));
        }
        if !(self.tick_interval_seconds.is_finite() && self.tick_interval_seconds > 0.0) {
            return Err(format!(
                "rule for {} needs a positive tick interval",
                self.output.key()
            ));
        }
        Ok(())
    }

    /// Ratio units that can be converted right now.
    ///
    /// For each input: floor(min(desired, stored) / ratio); the rule converts
    /// the smallest of those.
    pub fn ratio_units(&self, desired: &DesiredAmounts, ledger: &ResourceLedger) -> u32 {
        self.inputs
            .iter()
            .map(|input| {
                if input.ratio == 0 {
                    return 0;
                }
                let wanted = desired.get(&input.resource).copied().unwrap_or(0);
                wanted.min(ledger.get(input.resource)) / input.ratio
            })
            .min()
            .unwrap_or(0)
    }

    /// Output units a tick would produce
    pub fn compute_output(&self, desired: &DesiredAmounts, ledger: &ResourceLedger) -> u32 {
        self.ratio_units(desired, ledger)
            .saturating_mul(self.output_per_ratio_unit)
    }

    /// Run one conversion: consume inputs and add output together, or do nothing
    pub fn tick(&self, desired: &DesiredAmounts, ledger: &mut ResourceLedger) -> RuleTick {
        let ratio_units = self.ratio_units(desired, ledger);
        let produced = ratio_units.saturating_mul(self.output_per_ratio_unit);
        if produced == 0 {
            return RuleTick::default();
        }

        for input in &self.inputs {
            ledger.remove(input.resource, ratio_units * input.ratio);
        }
        ledger.add(self.output, produced);

        RuleTick {
            ratio_units,
            produced,
        }
    }
}

/// A pre-paid production order: pay for every unit at start, receive one per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecipe {
    pub id: String,
    pub name: String,
    pub cost_per_unit: Vec<(ResourceType, u32)>,
    pub output: ResourceType,
    pub output_per_unit: u32,
    pub tick_interval_seconds: f32,
}

impl BatchRecipe {
    /// Total cost of `units`, or `None` if it overflows
    pub fn cost_for(&self, units: u32) -> Option<Vec<(ResourceType, u32)>> {
        self.cost_per_unit
            .iter()
            .map(|(resource, amount)| amount.checked_mul(units).map(|total| (*resource, total)))
            .collect()
    }

    /// Largest number of units the ledger can pay for
    pub fn affordable_units(&self, ledger: &ResourceLedger) -> u32 {
        self.cost_per_unit
            .iter()
            .filter(|(_, amount)| *amount > 0)
            .map(|(resource, amount)| ledger.get(*resource) / amount)
            .min()
            .unwrap_or(u32::MAX)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("batch recipe has an empty id".into());
        }
        if self.output_per_unit == 0 {
            return Err(format!("batch recipe {} produces nothing", self.id));
        }
        if !(self.tick_interval_seconds.is_finite() && self.tick_interval_seconds > 0.0) {
            return Err(format!(
                "batch recipe {} needs a positive tick interval",
                self.id
            ));
        }
        Ok(())
    }
}
