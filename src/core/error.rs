use thiserror::Error;

use crate::core::types::SiteId;

#[derive(Error, Debug)]
pub enum EconomyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown runner: {0}")]
    UnknownRunner(String),

    #[error("Unknown module blueprint: {0}")]
    UnknownBlueprint(String),

    #[error("Construction site not found: {0:?}")]
    UnknownSite(SiteId),

    #[error("Runner {runner} is not a {expected} runner")]
    WrongRunnerKind {
        runner: String,
        expected: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EconomyError>;
