//! Station session - one game session's economy
//!
//! The session owns the ledger, every production runner and every module
//! construction site. Presentation code calls into it for player commands
//! and calls `update` once per frame with the frame delta. Runners are
//! advanced in declaration order, so a runner always sees the ledger as the
//! previous runner left it.

use std::path::Path;

use crate::construction::{CostAccumulator, ModuleCatalog, SpendReceipt};
use crate::core::config::EconomyConfig;
use crate::core::error::{EconomyError, Result};
use crate::core::types::{sanitize_delta, SiteId, Seconds};
use crate::economy::{ResourceLedger, ResourceType};
use crate::production::{
    BatchRunner, ConversionRunner, DesiredAmounts, ProductionEvent, Runner, RunnerStatus,
};

/// Something the presentation layer should react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Production(ProductionEvent),
    /// A placed module has been fully paid for
    ConstructionComplete { site: SiteId, blueprint: String },
}

/// A placed module and what it still costs
#[derive(Debug, Clone)]
pub struct ConstructionSite {
    pub id: SiteId,
    pub blueprint: String,
    pub cost: CostAccumulator,
}

impl ConstructionSite {
    pub fn is_complete(&self) -> bool {
        self.cost.is_complete()
    }
}

#[derive(Debug, Clone)]
pub struct StationSession {
    ledger: ResourceLedger,
    runners: Vec<Runner>,
    modules: ModuleCatalog,
    sites: Vec<ConstructionSite>,
    pending: Vec<SessionEvent>,
    elapsed: Seconds,
}

impl StationSession {
    /// Start a session from a validated config
    pub fn new(config: EconomyConfig) -> Result<Self> {
        config.validate()?;

        let max_ticks = config.max_ticks_per_advance;
        let mut runners = Vec::new();
        for runner in config.conversion_runners {
            runners.push(Runner::Conversion(
                ConversionRunner::new(runner.id, runner.rules).with_max_ticks_per_advance(max_ticks),
            ));
        }
        for recipe in config.batch_runners {
            runners.push(Runner::Batch(
                BatchRunner::new(recipe).with_max_ticks_per_advance(max_ticks),
            ));
        }

        tracing::info!(
            "Session started with {} runners and {} module blueprints",
            runners.len(),
            config.modules.all().len()
        );

        Ok(Self {
            ledger: ResourceLedger::with_balances(&config.starting_balances),
            runners,
            modules: config.modules,
            sites: Vec::new(),
            pending: Vec::new(),
            elapsed: 0.0,
        })
    }

    pub fn from_config_path(path: &Path) -> Result<Self> {
        Self::new(EconomyConfig::load_from_toml(path)?)
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Direct ledger access for collaborators outside the economy (debug tools)
    pub fn ledger_mut(&mut self) -> &mut ResourceLedger {
        &mut self.ledger
    }

    /// Total simulated time fed to `update`
    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn modules(&self) -> &ModuleCatalog {
        &self.modules
    }

    /// Resources gathered in the world (asteroid destroyed, ore mined)
    pub fn collect(&mut self, resource: ResourceType, amount: u32) {
        self.ledger.add(resource, amount);
    }

    pub fn runners(&self) -> &[Runner] {
        &self.runners
    }

    pub fn runner(&self, id: &str) -> Result<&Runner> {
        self.runners
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| EconomyError::UnknownRunner(id.to_string()))
    }

    pub fn runner_status(&self, id: &str) -> Result<RunnerStatus> {
        Ok(self.runner(id)?.status(&self.ledger))
    }

    /// Start a smelter-style runner. `Ok(false)` means nothing could be converted.
    pub fn start_conversion(&mut self, id: &str, desired: DesiredAmounts) -> Result<bool> {
        match find_runner_mut(&mut self.runners, id)? {
            Runner::Conversion(runner) => Ok(runner.start(desired, &self.ledger)),
            Runner::Batch(_) => Err(EconomyError::WrongRunnerKind {
                runner: id.to_string(),
                expected: "conversion",
            }),
        }
    }

    /// Start a reactor/fabricator-style runner. `Ok(false)` means the order
    /// could not be paid for.
    pub fn start_batch(&mut self, id: &str, units: u32) -> Result<bool> {
        match find_runner_mut(&mut self.runners, id)? {
            Runner::Batch(runner) => Ok(runner.start(units, &mut self.ledger)),
            Runner::Conversion(_) => Err(EconomyError::WrongRunnerKind {
                runner: id.to_string(),
                expected: "batch",
            }),
        }
    }

    pub fn stop(&mut self, id: &str) -> Result<()> {
        find_runner_mut(&mut self.runners, id)?.stop();
        Ok(())
    }

    /// Place a module; it starts with its full blueprint cost outstanding
    pub fn place_module(&mut self, blueprint_id: &str) -> Result<SiteId> {
        let blueprint = self
            .modules
            .get(blueprint_id)
            .ok_or_else(|| EconomyError::UnknownBlueprint(blueprint_id.to_string()))?;

        let site = ConstructionSite {
            id: SiteId::new(),
            blueprint: blueprint.id.clone(),
            cost: CostAccumulator::new(&blueprint.cost),
        };
        let id = site.id;
        tracing::info!("Placed {} ({:?})", blueprint.name, id);
        self.sites.push(site);
        Ok(id)
    }

    pub fn sites(&self) -> &[ConstructionSite] {
        &self.sites
    }

    pub fn site(&self, id: SiteId) -> Result<&ConstructionSite> {
        self.sites
            .iter()
            .find(|s| s.id == id)
            .ok_or(EconomyError::UnknownSite(id))
    }

    pub fn site_progress(&self, id: SiteId) -> Result<f32> {
        Ok(self.site(id)?.cost.progress_fraction())
    }

    /// Spend toward a site's cost from the ledger
    pub fn spend(&mut self, id: SiteId, resource: ResourceType, amount: u32) -> Result<SpendReceipt> {
        let site = find_site_mut(&mut self.sites, id)?;
        let receipt = site.cost.spend(resource, amount, &mut self.ledger);
        if receipt.completed {
            Self::record_completion(&mut self.pending, site);
        }
        Ok(receipt)
    }

    /// Spend everything the ledger can currently contribute to a site
    pub fn fund_site(&mut self, id: SiteId) -> Result<SpendReceipt> {
        let site = find_site_mut(&mut self.sites, id)?;
        let receipt = site.cost.spend_available(&mut self.ledger);
        if receipt.completed {
            Self::record_completion(&mut self.pending, site);
        }
        Ok(receipt)
    }

    fn record_completion(pending: &mut Vec<SessionEvent>, site: &ConstructionSite) {
        tracing::info!("Construction of {} complete ({:?})", site.blueprint, site.id);
        pending.push(SessionEvent::ConstructionComplete {
            site: site.id,
            blueprint: site.blueprint.clone(),
        });
    }

    /// Advance every runner by one frame and drain queued events
    pub fn update(&mut self, dt: Seconds) -> Vec<SessionEvent> {
        let dt = sanitize_delta(dt);
        self.elapsed += dt;

        let mut events = std::mem::take(&mut self.pending);
        for runner in &mut self.runners {
            events.extend(
                runner
                    .advance(dt, &mut self.ledger)
                    .into_iter()
                    .map(SessionEvent::Production),
            );
        }
        events
    }
}

fn find_runner_mut<'a>(runners: &'a mut [Runner], id: &str) -> Result<&'a mut Runner> {
    runners
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(|| EconomyError::UnknownRunner(id.to_string()))
}

fn find_site_mut(sites: &mut [ConstructionSite], id: SiteId) -> Result<&mut ConstructionSite> {
    sites
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or(EconomyError::UnknownSite(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::RunnerState;

    fn session() -> StationSession {
        StationSession::new(EconomyConfig::default()).unwrap()
    }

    #[test]
    fn test_starting_balances_applied() {
        let session = session();
        assert_eq!(session.ledger().get(ResourceType::Tritium), 20);
        assert_eq!(session.ledger().get(ResourceType::Energy), 100);
        assert_eq!(session.runners().len(), 3);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut session = session();
        assert!(matches!(
            session.start_batch("shipyard", 1),
            Err(EconomyError::UnknownRunner(_))
        ));
        assert!(matches!(
            session.place_module("shipyard"),
            Err(EconomyError::UnknownBlueprint(_))
        ));
        assert!(matches!(
            session.spend(SiteId::new(), ResourceType::Tritium, 1),
            Err(EconomyError::UnknownSite(_))
        ));
    }

    #[test]
    fn test_wrong_runner_kind() {
        let mut session = session();
        assert!(matches!(
            session.start_batch("smelter", 1),
            Err(EconomyError::WrongRunnerKind { .. })
        ));
        assert!(matches!(
            session.start_conversion("reactor", DesiredAmounts::new()),
            Err(EconomyError::WrongRunnerKind { .. })
        ));
    }

    #[test]
    fn test_collect_then_smelt() {
        let mut session = session();
        session.collect(ResourceType::Polonium, 9);

        let desired: DesiredAmounts = [(ResourceType::Polonium, 9)].into_iter().collect();
        assert!(session.start_conversion("smelter", desired).unwrap());

        // The polonium rule ticks every 5 seconds
        session.update(4.0);
        assert_eq!(session.ledger().get(ResourceType::PoloniumCrystal), 0);
        session.update(1.0);
        assert_eq!(session.ledger().get(ResourceType::PoloniumCrystal), 3);
        assert_eq!(session.ledger().get(ResourceType::Polonium), 0);
        assert_eq!(
            session.runner("smelter").unwrap().state(),
            RunnerState::Idle
        );
    }

    #[test]
    fn test_construction_event_delivered_once() {
        let mut session = session();
        session.ledger_mut().add(ResourceType::TritiumIngot, 10);
        session.ledger_mut().add(ResourceType::SilverCoin, 5);

        let site = session.place_module("turret").unwrap();
        let receipt = session.fund_site(site).unwrap();
        assert!(receipt.completed);
        assert_eq!(session.site_progress(site).unwrap(), 1.0);

        let events = session.update(0.0);
        assert_eq!(
            events,
            vec![SessionEvent::ConstructionComplete {
                site,
                blueprint: "turret".into()
            }]
        );
        assert!(session.update(0.0).is_empty());
    }

    #[test]
    fn test_update_ignores_bad_delta() {
        let mut session = session();
        session.update(-3.0);
        session.update(2.0);
        assert!((session.elapsed() - 2.0).abs() < f32::EPSILON);
    }
}
