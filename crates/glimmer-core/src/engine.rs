//! Station event engine - main entry point tying stations, glimmer and rules

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::components::Vec2;
use crate::config::EventCatalog;
use crate::generation::{generate_station, StationConfig, StationLayout};
use crate::persistence::{load_engine, save_engine, SaveError};
use crate::systems::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no event named {0} in the catalog")]
    UnknownEvent(String),
    #[error(transparent)]
    Ticker(#[from] TickerError),
}

/// Main station event engine
pub struct StationEventEngine {
    /// Stations and grids
    pub stations: StationMap,
    glimmer: Rc<RefCell<GlimmerPool>>,
    audit: Rc<RefCell<AdminLog>>,
    bus: Rc<GlimmerEventBus>,
    ticker: GameTicker,
    catalog: EventCatalog,
    rng: StdRng,
    /// Simulation time in seconds since start
    sim_time: f64,
    time_scale: f32,
}

impl StationEventEngine {
    /// Empty engine with no catalog and no glimmer
    pub fn new(seed: u64) -> Self {
        Self::with_catalog(EventCatalog::default(), seed)
    }

    pub fn with_catalog(catalog: EventCatalog, seed: u64) -> Self {
        let end_signal = RuleEndSignal::new();
        Self {
            stations: StationMap::new(),
            glimmer: GlimmerPool::shared(0),
            audit: AdminLog::shared(),
            bus: GlimmerEventBus::shared(),
            ticker: GameTicker::new(end_signal),
            catalog,
            rng: StdRng::seed_from_u64(seed),
            sim_time: 0.0,
            time_scale: 1.0,
        }
    }

    /// Generate a station and add it to the map
    pub fn generate(&mut self, config: &StationConfig) -> StationLayout {
        generate_station(&mut self.stations, config, &mut self.rng)
    }

    /// Handles for building rules against this engine
    pub fn services(&self) -> RuleServices {
        RuleServices {
            ledger: self.glimmer.clone(),
            audit: self.audit.clone(),
            bus: self.bus.clone(),
            end_signal: self.ticker.end_signal().clone(),
        }
    }

    /// Fresh random source for a new rule, derived from the engine seed
    pub fn rule_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.rng.gen())
    }

    /// Add and start the catalog event named `id`
    pub fn start_event(&mut self, id: &str) -> Result<(), EngineError> {
        let configuration = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownEvent(id.to_string()))?;
        let rng = self.rule_rng();
        let rule = GlimmerEventRule::from_configuration(configuration, self.services(), rng);
        self.add_rule(Box::new(rule))
    }

    /// Add and start a composed rule
    pub fn add_rule(&mut self, rule: Box<dyn StationEvent>) -> Result<(), EngineError> {
        let id = rule.id().to_string();
        self.ticker.add_rule(rule)?;
        self.ticker.start_rule(&id)?;
        Ok(())
    }

    /// Pick an eligible event by weight and start it.
    /// `Ok(None)` when nothing is eligible at the current glimmer level.
    pub fn start_random_event(&mut self) -> Result<Option<String>, EngineError> {
        let glimmer = self.glimmer();
        let ticker = &self.ticker;
        let picked = self
            .catalog
            .pick_weighted_by(glimmer, &mut self.rng, |e| !ticker.is_running(&e.id))
            .map(|e| e.id.clone());

        let Some(id) = picked else {
            log::debug!(target: "stationevents", "no event eligible at glimmer {}", glimmer);
            return Ok(None);
        };
        self.start_event(&id)?;
        Ok(Some(id))
    }

    /// Advance every running rule by `delta_seconds`
    pub fn update(&mut self, delta_seconds: f32) {
        let scaled_delta = delta_seconds * self.time_scale;
        self.sim_time += scaled_delta as f64;
        self.ticker.update(scaled_delta);
    }

    /// End a running event now. `false` if it is not running.
    pub fn end_event(&mut self, id: &str) -> bool {
        self.ticker.end_rule(id)
    }

    pub fn end_all_events(&mut self) -> usize {
        self.ticker.end_all()
    }

    /// Pick a usable tile anywhere on the map
    pub fn find_random_tile(&mut self) -> Option<TileTarget> {
        try_find_random_tile(&self.stations, &self.stations, &mut self.rng)
    }

    /// World position of a found tile's centre
    pub fn tile_world_position(&self, target: &TileTarget) -> Option<Vec2> {
        let placement = self.stations.grid_placement(target.grid)?;
        Some(placement.world_position + target.coordinates.position)
    }

    pub fn glimmer(&self) -> i32 {
        self.glimmer.borrow().glimmer()
    }

    pub fn glimmer_tier(&self) -> GlimmerTier {
        self.glimmer.borrow().tier()
    }

    pub fn set_glimmer(&mut self, glimmer: i32) {
        self.glimmer.borrow_mut().set_glimmer(glimmer);
    }

    pub fn add_glimmer(&mut self, delta: i32) {
        self.glimmer.borrow_mut().add_to_glimmer(delta);
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.borrow().entries().to_vec()
    }

    /// Reports raised by ended events, oldest first
    pub fn reports(&self) -> Vec<GlimmerEventEnded> {
        self.bus.history()
    }

    /// Remove and return the reports raised so far
    pub fn take_reports(&mut self) -> Vec<GlimmerEventEnded> {
        self.bus.drain_history()
    }

    pub fn bus(&self) -> &Rc<GlimmerEventBus> {
        &self.bus
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn running_events(&self) -> Vec<String> {
        self.ticker.running_rules().map(str::to_string).collect()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.ticker.is_running(id)
    }

    pub fn ended_total(&self) -> usize {
        self.ticker.ended_total()
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Simulation time in seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Save engine state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), SaveError> {
        save_engine(
            writer,
            self.sim_time,
            self.time_scale,
            &self.glimmer.borrow(),
            &self.catalog,
            &self.stations,
        )
    }

    /// Load engine state from a reader. Running rules are dropped unended and
    /// the report and audit history start over.
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_engine(reader)?;

        self.sim_time = loaded.sim_time;
        self.time_scale = loaded.time_scale;
        self.catalog = loaded.catalog;
        self.stations = loaded.stations;
        *self.glimmer.borrow_mut() = loaded.glimmer;
        self.bus.drain_history();
        self.audit.borrow_mut().clear();

        let end_signal = self.ticker.end_signal().clone();
        end_signal.take();
        self.ticker = GameTicker::new(end_signal);

        Ok(())
    }
}

impl Default for StationEventEngine {
    fn default() -> Self {
        Self::new(0)
    }
}
