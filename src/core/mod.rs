pub mod config;
pub mod error;
pub mod types;

pub use config::EconomyConfig;
pub use error::{EconomyError, Result};
