//! Production runners - timed start/stop/advance state machines
//!
//! Runners are driven by an externally supplied frame delta. Each runner
//! counts down its own tick interval and, when the countdown expires, runs
//! one production tick against the session ledger:
//! - `ConversionRunner` feeds player-chosen amounts through ratio rules
//! - `BatchRunner` pays for a whole order at start and releases one unit per tick
//!
//! Withholding the delta pauses production without any special casing.

use serde::{Deserialize, Serialize};

use crate::core::config::DEFAULT_MAX_TICKS_PER_ADVANCE;
use crate::core::types::{sanitize_delta, Seconds};
use crate::economy::{ResourceLedger, ResourceType};
use crate::production::rule::{BatchRecipe, DesiredAmounts, ProductionRule};

/// Whether a runner is currently producing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunnerState {
    Idle,
    Running,
}

/// Something that happened during `advance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductionEvent {
    /// A tick added output to the ledger
    Produced {
        runner: String,
        resource: ResourceType,
        amount: u32,
    },
    /// The runner ran out of work and went idle on its own
    Finished { runner: String },
}

/// Snapshot for a progress display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunnerStatus {
    pub state: RunnerState,
    /// Seconds until the next tick (0 when idle)
    pub time_remaining: Seconds,
    /// How far through the current cycle, 0.0 to 1.0
    pub cycle_progress: f32,
    /// Output units the next tick would add, given the current ledger
    pub producible_next_tick: u32,
    /// Pre-paid units not yet delivered
    pub reserved_units: u32,
}

/// Single countdown driving a batch runner
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerClock {
    state: RunnerState,
    countdown: Seconds,
    interval: Seconds,
    max_ticks_per_advance: u32,
}

impl RunnerClock {
    pub fn new(interval: Seconds) -> Self {
        Self {
            state: RunnerState::Idle,
            countdown: 0.0,
            interval,
            max_ticks_per_advance: DEFAULT_MAX_TICKS_PER_ADVANCE,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunnerState::Running
    }

    pub fn countdown(&self) -> Seconds {
        self.countdown
    }

    pub fn interval(&self) -> Seconds {
        self.interval
    }

    fn start(&mut self) {
        self.state = RunnerState::Running;
        self.countdown = self.interval;
    }

    fn stop(&mut self) {
        self.state = RunnerState::Idle;
        self.countdown = 0.0;
    }

    fn cycle_progress(&self) -> f32 {
        if !self.is_running() || self.interval <= 0.0 {
            return 0.0;
        }
        (1.0 - self.countdown / self.interval).clamp(0.0, 1.0)
    }

    /// Run `tick` once per expired interval while running.
    ///
    /// `tick` returns false when no further production is possible, which
    /// stops the clock. Returns the number of ticks run.
    fn run_due<F>(&mut self, dt: Seconds, mut tick: F) -> u32
    where
        F: FnMut() -> bool,
    {
        if !self.is_running() {
            return 0;
        }
        self.countdown -= sanitize_delta(dt);

        let mut ticks = 0;
        while self.is_running() && self.countdown <= 0.0 && ticks < self.max_ticks_per_advance {
            ticks += 1;
            self.countdown += self.interval;
            if !tick() {
                self.stop();
            }
        }

        // Backlog beyond the cap is dropped, not carried
        if self.is_running() && self.countdown <= 0.0 {
            self.countdown = self.interval;
        }
        ticks
    }
}

/// Smelter-style runner: independent ratio rules fed from desired amounts.
///
/// Each rule keeps its own countdown and ticks at its own interval. The rules
/// share the runner's state and desired amounts; the runner goes idle once no
/// rule can produce from what remains.
#[derive(Debug, Clone)]
pub struct ConversionRunner {
    id: String,
    rules: Vec<ProductionRule>,
    desired: DesiredAmounts,
    state: RunnerState,
    countdowns: Vec<Seconds>,
    max_ticks_per_advance: u32,
}

impl ConversionRunner {
    pub fn new(id: impl Into<String>, rules: Vec<ProductionRule>) -> Self {
        let countdowns = vec![0.0; rules.len()];
        Self {
            id: id.into(),
            rules,
            desired: DesiredAmounts::new(),
            state: RunnerState::Idle,
            countdowns,
            max_ticks_per_advance: DEFAULT_MAX_TICKS_PER_ADVANCE,
        }
    }

    pub fn with_max_ticks_per_advance(mut self, max: u32) -> Self {
        self.max_ticks_per_advance = max.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunnerState::Running
    }

    /// Seconds until each rule's next tick, in rule order
    pub fn countdowns(&self) -> &[Seconds] {
        &self.countdowns
    }

    /// Input still queued for conversion
    pub fn desired(&self, resource: ResourceType) -> u32 {
        self.desired.get(&resource).copied().unwrap_or(0)
    }

    /// Output each rule would produce for `desired`, in rule order
    pub fn estimate(
        &self,
        desired: &DesiredAmounts,
        ledger: &ResourceLedger,
    ) -> Vec<(ResourceType, u32)> {
        self.rules
            .iter()
            .map(|rule| (rule.output, rule.compute_output(desired, ledger)))
            .collect()
    }

    fn can_produce(
        rules: &[ProductionRule],
        desired: &DesiredAmounts,
        ledger: &ResourceLedger,
    ) -> bool {
        rules
            .iter()
            .any(|rule| rule.compute_output(desired, ledger) >= 1)
    }

    /// Begin converting.
    ///
    /// Returns false and changes nothing if the runner is already running or
    /// no rule would produce at least one unit. Call `stop` first to replace
    /// a running order.
    pub fn start(&mut self, desired: DesiredAmounts, ledger: &ResourceLedger) -> bool {
        if self.is_running() {
            tracing::debug!("{}: start rejected, already running", self.id);
            return false;
        }
        if !Self::can_produce(&self.rules, &desired, ledger) {
            tracing::debug!("{}: start rejected, nothing to convert", self.id);
            return false;
        }
        self.desired = desired;
        self.state = RunnerState::Running;
        for (countdown, rule) in self.countdowns.iter_mut().zip(&self.rules) {
            *countdown = rule.tick_interval_seconds;
        }
        tracing::info!("{}: started conversion", self.id);
        true
    }

    /// Stop immediately. Unconverted desired amounts are discarded.
    pub fn stop(&mut self) {
        if self.is_running() {
            tracing::info!("{}: stopped", self.id);
        }
        self.go_idle();
    }

    fn go_idle(&mut self) {
        self.desired.clear();
        self.state = RunnerState::Idle;
        self.countdowns.iter_mut().for_each(|c| *c = 0.0);
    }

    /// The expired rule that fell due first; ties go to the earlier rule
    fn next_due(&self) -> Option<usize> {
        self.countdowns
            .iter()
            .enumerate()
            .filter(|(_, countdown)| **countdown <= 0.0)
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
    }

    fn tick_rule(
        &mut self,
        index: usize,
        ledger: &mut ResourceLedger,
        events: &mut Vec<ProductionEvent>,
    ) {
        let rule = &self.rules[index];
        let result = rule.tick(&self.desired, ledger);
        if result.is_empty() {
            return;
        }
        for input in &rule.inputs {
            if let Some(wanted) = self.desired.get_mut(&input.resource) {
                *wanted = wanted.saturating_sub(result.ratio_units * input.ratio);
            }
        }
        tracing::debug!("{}: produced {} {}", self.id, result.produced, rule.output);
        events.push(ProductionEvent::Produced {
            runner: self.id.clone(),
            resource: rule.output,
            amount: result.produced,
        });
    }

    /// Run every rule whose countdown expires within `dt`, in the order they
    /// fall due. Catch-up is bounded by the tick cap; backlog past it is dropped.
    pub fn advance(&mut self, dt: Seconds, ledger: &mut ResourceLedger) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }

        let dt = sanitize_delta(dt);
        self.countdowns.iter_mut().for_each(|c| *c -= dt);

        let mut ticks = 0;
        while ticks < self.max_ticks_per_advance {
            let Some(index) = self.next_due() else {
                break;
            };
            ticks += 1;
            self.countdowns[index] += self.rules[index].tick_interval_seconds;
            self.tick_rule(index, ledger, &mut events);

            if !Self::can_produce(&self.rules, &self.desired, ledger) {
                self.go_idle();
                tracing::info!("{}: conversion finished", self.id);
                events.push(ProductionEvent::Finished {
                    runner: self.id.clone(),
                });
                return events;
            }
        }

        for (countdown, rule) in self.countdowns.iter_mut().zip(&self.rules) {
            if *countdown <= 0.0 {
                *countdown = rule.tick_interval_seconds;
            }
        }
        events
    }

    /// The rule due soonest drives the progress display
    pub fn status(&self, ledger: &ResourceLedger) -> RunnerStatus {
        let next = self
            .countdowns
            .iter()
            .zip(&self.rules)
            .min_by(|a, b| a.0.total_cmp(b.0));

        match next {
            Some((countdown, rule)) if self.is_running() => RunnerStatus {
                state: self.state,
                time_remaining: *countdown,
                cycle_progress: (1.0 - countdown / rule.tick_interval_seconds).clamp(0.0, 1.0),
                producible_next_tick: self
                    .estimate(&self.desired, ledger)
                    .iter()
                    .map(|(_, amount)| *amount)
                    .fold(0u32, u32::saturating_add),
                reserved_units: 0,
            },
            _ => RunnerStatus {
                state: self.state,
                time_remaining: 0.0,
                cycle_progress: 0.0,
                producible_next_tick: 0,
                reserved_units: 0,
            },
        }
    }
}

/// Reactor/fabricator-style runner: pre-paid units released one per tick
#[derive(Debug, Clone)]
pub struct BatchRunner {
    recipe: BatchRecipe,
    reserved_units: u32,
    clock: RunnerClock,
}

impl BatchRunner {
    pub fn new(recipe: BatchRecipe) -> Self {
        let clock = RunnerClock::new(recipe.tick_interval_seconds);
        Self {
            recipe,
            reserved_units: 0,
            clock,
        }
    }

    pub fn with_max_ticks_per_advance(mut self, max: u32) -> Self {
        self.clock.max_ticks_per_advance = max.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.recipe.id
    }

    pub fn recipe(&self) -> &BatchRecipe {
        &self.recipe
    }

    pub fn state(&self) -> RunnerState {
        self.clock.state()
    }

    pub fn clock(&self) -> &RunnerClock {
        &self.clock
    }

    pub fn reserved_units(&self) -> u32 {
        self.reserved_units
    }

    /// Pay for `units` and begin releasing them.
    ///
    /// Returns false and changes nothing if `units` is zero, the runner is
    /// already busy, or the ledger cannot cover the whole order.
    pub fn start(&mut self, units: u32, ledger: &mut ResourceLedger) -> bool {
        if units == 0 || self.clock.is_running() {
            return false;
        }
        let cost = match self.recipe.cost_for(units) {
            Some(cost) => cost,
            None => return false,
        };
        if !ledger.try_spend(&cost) {
            tracing::debug!(
                "{}: start rejected, cannot afford {} units",
                self.recipe.id,
                units
            );
            return false;
        }
        self.reserved_units = units;
        self.clock.start();
        tracing::info!("{}: started batch of {} units", self.recipe.id, units);
        true
    }

    /// Stop immediately. Undelivered pre-paid units are forfeited.
    pub fn stop(&mut self) {
        if self.clock.is_running() {
            tracing::info!(
                "{}: stopped, forfeiting {} reserved units",
                self.recipe.id,
                self.reserved_units
            );
        }
        self.reserved_units = 0;
        self.clock.stop();
    }

    pub fn advance(&mut self, dt: Seconds, ledger: &mut ResourceLedger) -> Vec<ProductionEvent> {
        let mut events = Vec::new();
        let was_running = self.clock.is_running();

        let recipe = &self.recipe;
        let reserved = &mut self.reserved_units;
        self.clock.run_due(dt, || {
            if *reserved == 0 {
                return false;
            }
            *reserved -= 1;
            ledger.add(recipe.output, recipe.output_per_unit);
            tracing::debug!("{}: produced {} {}", recipe.id, recipe.output_per_unit, recipe.output);
            events.push(ProductionEvent::Produced {
                runner: recipe.id.clone(),
                resource: recipe.output,
                amount: recipe.output_per_unit,
            });
            *reserved > 0
        });

        if was_running && !self.clock.is_running() {
            tracing::info!("{}: batch finished", self.recipe.id);
            events.push(ProductionEvent::Finished {
                runner: self.recipe.id.clone(),
            });
        }
        events
    }

    pub fn status(&self) -> RunnerStatus {
        let running = self.clock.is_running();
        RunnerStatus {
            state: self.clock.state(),
            time_remaining: if running { self.clock.countdown() } else { 0.0 },
            cycle_progress: self.clock.cycle_progress(),
            producible_next_tick: if running && self.reserved_units > 0 {
                self.recipe.output_per_unit
            } else {
                0
            },
            reserved_units: self.reserved_units,
        }
    }
}

/// Either runner flavour, as held by a session
#[derive(Debug, Clone)]
pub enum Runner {
    Conversion(ConversionRunner),
    Batch(BatchRunner),
}

impl Runner {
    pub fn id(&self) -> &str {
        match self {
            Runner::Conversion(r) => r.id(),
            Runner::Batch(r) => r.id(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Runner::Conversion(_) => "conversion",
            Runner::Batch(_) => "batch",
        }
    }

    pub fn state(&self) -> RunnerState {
        match self {
            Runner::Conversion(r) => r.state(),
            Runner::Batch(r) => r.state(),
        }
    }

    pub fn stop(&mut self) {
        match self {
            Runner::Conversion(r) => r.stop(),
            Runner::Batch(r) => r.stop(),
        }
    }

    pub fn advance(&mut self, dt: Seconds, ledger: &mut ResourceLedger) -> Vec<ProductionEvent> {
        match self {
            Runner::Conversion(r) => r.advance(dt, ledger),
            Runner::Batch(r) => r.advance(dt, ledger),
        }
    }

    pub fn status(&self, ledger: &ResourceLedger) -> RunnerStatus {
        match self {
            Runner::Conversion(r) => r.status(ledger),
            Runner::Batch(r) => r.status(),
        }
    }
}
