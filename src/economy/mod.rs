//! Economy layer - resource kinds and the session ledger

pub mod ledger;
pub mod resource;

pub use ledger::ResourceLedger;
pub use resource::{ResourceTier, ResourceType};
