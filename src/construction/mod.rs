//! Construction layer - station module blueprints and their build costs

pub mod accumulator;
pub mod module;

pub use accumulator::{CostAccumulator, SpendReceipt};
pub use module::{ModuleBlueprint, ModuleCatalog};
