//! Station Economy - resource ledger, production runners and build costs
//! for Operation Station

pub mod construction;
pub mod core;
pub mod economy;
pub mod production;
pub mod session;

pub use crate::core::{EconomyConfig, EconomyError, Result};
pub use crate::economy::{ResourceLedger, ResourceType};
pub use crate::session::{SessionEvent, StationSession};
