//! Resource kinds tracked by the station economy
//!
//! The set is closed: raw ore collected from asteroids, the refined goods the
//! smelter turns them into, and energy as an abstract currency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tier a resource belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceTier {
    Raw,
    Refined,
    Abstract,
}

/// A kind of resource held in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Tritium,
    Silver,
    Polonium,
    TritiumIngot,
    SilverCoin,
    PoloniumCrystal,
    Energy,
}

impl ResourceType {
    /// Every resource, in declaration order
    pub const ALL: [ResourceType; 7] = [
        ResourceType::Tritium,
        ResourceType::Silver,
        ResourceType::Polonium,
        ResourceType::TritiumIngot,
        ResourceType::SilverCoin,
        ResourceType::PoloniumCrystal,
        ResourceType::Energy,
    ];

    pub fn tier(&self) -> ResourceTier {
        match self {
            ResourceType::Tritium | ResourceType::Silver | ResourceType::Polonium => {
                ResourceTier::Raw
            }
            ResourceType::TritiumIngot
            | ResourceType::SilverCoin
            | ResourceType::PoloniumCrystal => ResourceTier::Refined,
            ResourceType::Energy => ResourceTier::Abstract,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.tier() == ResourceTier::Raw
    }

    pub fn is_refined(&self) -> bool {
        self.tier() == ResourceTier::Refined
    }

    /// The refined good a raw ore smelts into
    pub fn refined_form(&self) -> Option<ResourceType> {
        match self {
            ResourceType::Tritium => Some(ResourceType::TritiumIngot),
            ResourceType::Silver => Some(ResourceType::SilverCoin),
            ResourceType::Polonium => Some(ResourceType::PoloniumCrystal),
            _ => None,
        }
    }

    /// Snake-case key used in config files and scripts
    pub fn key(&self) -> &'static str {
        match self {
            ResourceType::Tritium => "tritium",
            ResourceType::Silver => "silver",
            ResourceType::Polonium => "polonium",
            ResourceType::TritiumIngot => "tritium_ingot",
            ResourceType::SilverCoin => "silver_coin",
            ResourceType::PoloniumCrystal => "polonium_crystal",
            ResourceType::Energy => "energy",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceType::Tritium => "Tritium",
            ResourceType::Silver => "Silver",
            ResourceType::Polonium => "Polonium",
            ResourceType::TritiumIngot => "Tritium Ingot",
            ResourceType::SilverCoin => "Silver Coin",
            ResourceType::PoloniumCrystal => "Polonium Crystal",
            ResourceType::Energy => "Energy",
        }
    }

    /// Look up a resource by key or display name, ignoring case.
    ///
    /// Returns `None` for anything outside the closed set.
    pub fn from_name(name: &str) -> Option<ResourceType> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|r| r.key() == normalized)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
