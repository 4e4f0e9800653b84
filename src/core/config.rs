//! Economy configuration
//!
//! Starting balances, production rules, batch recipes and module costs.
//! `EconomyConfig::default()` is the tuned built-in economy; the same data is
//! shipped as `data/economy.toml` so designers can tweak it without a rebuild.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::construction::module::{ModuleBlueprint, ModuleCatalog};
use crate::core::error::{EconomyError, Result};
use crate::economy::ResourceType;
use crate::production::rule::{BatchRecipe, ProductionRule, RuleInput};

/// Upper bound on ticks a single `advance` call may run.
///
/// A long frame (or a resumed pause) would otherwise replay every missed
/// interval at once. At 32, a 10 second reactor catches up at most 320
/// seconds of backlog in one frame; anything beyond is dropped.
pub const DEFAULT_MAX_TICKS_PER_ADVANCE: u32 = 32;

/// A conversion runner and the rules it drives
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRunnerConfig {
    pub id: String,
    pub rules: Vec<ProductionRule>,
}

/// Everything needed to start a session
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyConfig {
    /// Cap on catch-up ticks per runner per frame
    pub max_ticks_per_advance: u32,

    /// Ledger contents at session start, in resource declaration order
    pub starting_balances: Vec<(ResourceType, u32)>,

    /// Smelter-style runners, in update order
    pub conversion_runners: Vec<ConversionRunnerConfig>,

    /// Reactor/fabricator-style runners, updated after conversion runners
    pub batch_runners: Vec<BatchRecipe>,

    /// Buildable modules
    pub modules: ModuleCatalog,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            max_ticks_per_advance: DEFAULT_MAX_TICKS_PER_ADVANCE,

            // Enough to fund the first smelt before any asteroid is mined
            starting_balances: vec![
                (ResourceType::Tritium, 20),
                (ResourceType::Silver, 10),
                (ResourceType::Energy, 100),
            ],

            // Ratios get worse as the ore gets rarer: tritium < silver < polonium
            conversion_runners: vec![ConversionRunnerConfig {
                id: "smelter".into(),
                rules: vec![
                    ProductionRule::single(ResourceType::Tritium, 2, ResourceType::TritiumIngot, 3.0),
                    ProductionRule::single(ResourceType::Silver, 2, ResourceType::SilverCoin, 3.0),
                    ProductionRule::single(
                        ResourceType::Polonium,
                        3,
                        ResourceType::PoloniumCrystal,
                        5.0,
                    ),
                ],
            }],

            batch_runners: vec![
                // One crystal burns for 10 seconds and yields 25 energy
                BatchRecipe {
                    id: "reactor".into(),
                    name: "Reactor".into(),
                    cost_per_unit: vec![(ResourceType::PoloniumCrystal, 1)],
                    output: ResourceType::Energy,
                    output_per_unit: 25,
                    tick_interval_seconds: 10.0,
                },
                // Energy-hungry shortcut for crystals when polonium ore is scarce
                BatchRecipe {
                    id: "fabricator".into(),
                    name: "Fabricator".into(),
                    cost_per_unit: vec![
                        (ResourceType::Energy, 40),
                        (ResourceType::TritiumIngot, 1),
                    ],
                    output: ResourceType::PoloniumCrystal,
                    output_per_unit: 1,
                    tick_interval_seconds: 15.0,
                },
            ],

            modules: ModuleCatalog::with_defaults(),
        }
    }
}

impl EconomyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a config from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let raw: TomlEconomy = toml::from_str(content)?;
        let config = raw.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_ticks_per_advance == 0 {
            return Err(invalid("max_ticks_per_advance must be at least 1"));
        }

        let mut runner_ids: Vec<&str> = Vec::new();
        for runner in &self.conversion_runners {
            if runner.rules.is_empty() {
                return Err(invalid(format!("runner {} has no rules", runner.id)));
            }
            for rule in &runner.rules {
                rule.validate().map_err(EconomyError::InvalidConfig)?;
            }
            runner_ids.push(&runner.id);
        }
        for recipe in &self.batch_runners {
            recipe.validate().map_err(EconomyError::InvalidConfig)?;
            runner_ids.push(&recipe.id);
        }
        for (i, id) in runner_ids.iter().enumerate() {
            if id.is_empty() {
                return Err(invalid("runner with an empty id"));
            }
            if runner_ids[..i].contains(id) {
                return Err(invalid(format!("duplicate runner id {}", id)));
            }
        }

        for blueprint in self.modules.all() {
            if blueprint.id.is_empty() {
                return Err(invalid("module with an empty id"));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EconomyError {
    EconomyError::InvalidConfig(message.into())
}

fn parse_resource(name: &str) -> Result<ResourceType> {
    ResourceType::from_name(name).ok_or_else(|| invalid(format!("unknown resource type: {}", name)))
}

fn default_max_ticks() -> u32 {
    DEFAULT_MAX_TICKS_PER_ADVANCE
}

fn default_one() -> u32 {
    1
}

/// TOML representation of the economy file
#[derive(Debug, Deserialize)]
struct TomlEconomy {
    #[serde(default = "default_max_ticks")]
    max_ticks_per_advance: u32,
    #[serde(default)]
    starting_balances: BTreeMap<String, u32>,
    #[serde(default)]
    conversion_runners: Vec<TomlConversionRunner>,
    #[serde(default)]
    batch_runners: Vec<TomlBatchRunner>,
    #[serde(default)]
    modules: Vec<TomlModule>,
}

#[derive(Debug, Deserialize)]
struct TomlConversionRunner {
    id: String,
    rules: Vec<TomlRule>,
}

#[derive(Debug, Deserialize)]
struct TomlRule {
    output: String,
    inputs: Vec<TomlRuleInput>,
    #[serde(default = "default_one")]
    output_per_ratio_unit: u32,
    tick_interval_seconds: f32,
}

#[derive(Debug, Deserialize)]
struct TomlRuleInput {
    resource: String,
    ratio: u32,
}

#[derive(Debug, Deserialize)]
struct TomlBatchRunner {
    id: String,
    name: String,
    cost_per_unit: Vec<TomlResourceAmount>,
    output: String,
    #[serde(default = "default_one")]
    output_per_unit: u32,
    tick_interval_seconds: f32,
}

#[derive(Debug, Deserialize)]
struct TomlModule {
    id: String,
    name: String,
    cost: Vec<TomlResourceAmount>,
}

/// TOML representation of a resource amount
#[derive(Debug, Deserialize)]
struct TomlResourceAmount {
    resource: String,
    amount: u32,
}

impl TomlResourceAmount {
    fn into_resource_amount(self) -> Result<(ResourceType, u32)> {
        Ok((parse_resource(&self.resource)?, self.amount))
    }
}

fn into_amounts(amounts: Vec<TomlResourceAmount>) -> Result<Vec<(ResourceType, u32)>> {
    amounts
        .into_iter()
        .map(TomlResourceAmount::into_resource_amount)
        .collect()
}

impl TomlRule {
    fn into_rule(self) -> Result<ProductionRule> {
        let inputs = self
            .inputs
            .into_iter()
            .map(|input| -> Result<RuleInput> {
                Ok(RuleInput {
                    resource: parse_resource(&input.resource)?,
                    ratio: input.ratio,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductionRule::new(
            parse_resource(&self.output)?,
            inputs,
            self.output_per_ratio_unit,
            self.tick_interval_seconds,
        ))
    }
}

impl TomlEconomy {
    fn into_config(self) -> Result<EconomyConfig> {
        let mut starting_balances = self
            .starting_balances
            .into_iter()
            .map(|(name, amount)| -> Result<(ResourceType, u32)> {
                Ok((parse_resource(&name)?, amount))
            })
            .collect::<Result<Vec<_>>>()?;
        starting_balances.sort_by_key(|(resource, _)| *resource);

        let conversion_runners = self
            .conversion_runners
            .into_iter()
            .map(|runner| -> Result<ConversionRunnerConfig> {
                Ok(ConversionRunnerConfig {
                    id: runner.id,
                    rules: runner
                        .rules
                        .into_iter()
                        .map(TomlRule::into_rule)
                        .collect::<Result<Vec<_>>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_runners = self
            .batch_runners
            .into_iter()
            .map(|batch| -> Result<BatchRecipe> {
                Ok(BatchRecipe {
                    id: batch.id,
                    name: batch.name,
                    cost_per_unit: into_amounts(batch.cost_per_unit)?,
                    output: parse_resource(&batch.output)?,
                    output_per_unit: batch.output_per_unit,
                    tick_interval_seconds: batch.tick_interval_seconds,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut modules = ModuleCatalog::new();
        for module in self.modules {
            if modules.get(&module.id).is_some() {
                return Err(invalid(format!("duplicate module id {}", module.id)));
            }
            modules.add(ModuleBlueprint {
                id: module.id,
                name: module.name,
                cost: into_amounts(module.cost)?,
            });
        }

        Ok(EconomyConfig {
            max_ticks_per_advance: self.max_ticks_per_advance,
            starting_balances,
            conversion_runners,
            batch_runners,
            modules,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EconomyConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_shipped_file_matches_defaults() {
        let config = EconomyConfig::parse_toml(include_str!("../../data/economy.toml")).unwrap();
        assert_eq!(config, EconomyConfig::default());
    }

    #[test]
    fn test_parse_minimal() {
        let config = EconomyConfig::parse_toml(
            r#"
            [starting_balances]
            energy = 5
            tritium = 3

            [[conversion_runners]]
            id = "smelter"

            [[conversion_runners.rules]]
            output = "tritium_ingot"
            tick_interval_seconds = 2.0
            inputs = [{ resource = "tritium", ratio = 2 }]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_ticks_per_advance, DEFAULT_MAX_TICKS_PER_ADVANCE);
        assert_eq!(
            config.starting_balances,
            vec![(ResourceType::Tritium, 3), (ResourceType::Energy, 5)]
        );
        assert_eq!(config.conversion_runners.len(), 1);
        let rule = &config.conversion_runners[0].rules[0];
        assert_eq!(rule.output, ResourceType::TritiumIngot);
        assert_eq!(rule.output_per_ratio_unit, 1);
        assert!(config.batch_runners.is_empty());
        assert!(config.modules.all().is_empty());
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let result = EconomyConfig::parse_toml(
            r#"
            [starting_balances]
            unobtainium = 5
            "#,
        );
        assert!(matches!(result, Err(EconomyError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = EconomyConfig::parse_toml("[[batch_runners]]\nid = ");
        assert!(matches!(result, Err(EconomyError::ConfigParse(_))));
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let result = EconomyConfig::parse_toml(
            r#"
            [[conversion_runners]]
            id = "smelter"

            [[conversion_runners.rules]]
            output = "silver_coin"
            tick_interval_seconds = 1.0
            inputs = [{ resource = "silver", ratio = 0 }]
            "#,
        );
        assert!(matches!(result, Err(EconomyError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_runner_ids_rejected() {
        let mut config = EconomyConfig::default();
        let mut reactor = config.batch_runners[0].clone();
        reactor.id = "smelter".into();
        config.batch_runners.push(reactor);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_module_ids_rejected() {
        let result = EconomyConfig::parse_toml(
            r#"
            [[modules]]
            id = "turret"
            name = "Turret"
            cost = [{ resource = "tritium_ingot", amount = 10 }]

            [[modules]]
            id = "turret"
            name = "Cheap Turret"
            cost = [{ resource = "tritium_ingot", amount = 1 }]
            "#,
        );
        match result {
            Err(EconomyError::InvalidConfig(message)) => assert!(message.contains("turret")),
            other => panic!("expected duplicate module error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_tick_cap_rejected() {
        let config = EconomyConfig {
            max_ticks_per_advance: 0,
            ..EconomyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = EconomyConfig::load_from_toml(Path::new("/nonexistent/economy.toml"));
        assert!(matches!(result, Err(EconomyError::Io(_))));
    }
}
