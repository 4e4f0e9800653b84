//! Production layer - conversion rules and the runners that drive them

pub mod rule;
pub mod runner;

pub use rule::{BatchRecipe, DesiredAmounts, ProductionRule, RuleInput, RuleTick};
pub use runner::{
    BatchRunner, ConversionRunner, ProductionEvent, Runner, RunnerClock, RunnerState,
    RunnerStatus,
};
