//! Station module blueprints - what can be built and what it costs

use serde::{Deserialize, Serialize};

use crate::economy::ResourceType;

/// A constructible station module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleBlueprint {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Resources required to finish construction
    pub cost: Vec<(ResourceType, u32)>,
}

impl ModuleBlueprint {
    pub fn total_cost(&self) -> u64 {
        self.cost.iter().map(|(_, amount)| *amount as u64).sum()
    }
}

/// Catalog of all buildable modules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleCatalog {
    blueprints: Vec<ModuleBlueprint>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in blueprints
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(ModuleBlueprint {
            id: "turret".into(),
            name: "Defense Turret".into(),
            cost: vec![
                (ResourceType::TritiumIngot, 10),
                (ResourceType::SilverCoin, 5),
            ],
        });

        catalog.add(ModuleBlueprint {
            id: "habitat".into(),
            name: "Habitat Ring".into(),
            cost: vec![
                (ResourceType::TritiumIngot, 20),
                (ResourceType::Energy, 50),
            ],
        });

        catalog.add(ModuleBlueprint {
            id: "death_cat".into(),
            name: "Death Cat".into(),
            cost: vec![
                (ResourceType::TritiumIngot, 100),
                (ResourceType::SilverCoin, 100),
                (ResourceType::PoloniumCrystal, 50),
                (ResourceType::Energy, 500),
            ],
        });

        catalog
    }

    /// Add a blueprint, replacing any existing one with the same id
    pub fn add(&mut self, blueprint: ModuleBlueprint) {
        match self.blueprints.iter_mut().find(|b| b.id == blueprint.id) {
            Some(existing) => *existing = blueprint,
            None => self.blueprints.push(blueprint),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleBlueprint> {
        self.blueprints.iter().find(|b| b.id == id)
    }

    pub fn all(&self) -> &[ModuleBlueprint] {
        &self.blueprints
    }
}
