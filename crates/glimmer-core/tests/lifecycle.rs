//! End-to-end station event lifecycle scenarios

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glimmer_core::components::{GridCoordinates, MapGrid, TileKind, Vec2, Vec2i};
use glimmer_core::config::{EventCatalog, GlimmerEventConfig};
use glimmer_core::engine::StationEventEngine;
use glimmer_core::generation::StationConfig;
use glimmer_core::systems::*;
use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Host {
    pool: Rc<RefCell<GlimmerPool>>,
    audit: Rc<RefCell<AdminLog>>,
    bus: Rc<GlimmerEventBus>,
    ticker: GameTicker,
}

impl Host {
    fn new(glimmer: i32) -> Self {
        Self {
            pool: GlimmerPool::shared(glimmer),
            audit: AdminLog::shared(),
            bus: GlimmerEventBus::shared(),
            ticker: GameTicker::new(RuleEndSignal::new()),
        }
    }

    fn services(&self) -> RuleServices {
        RuleServices {
            ledger: self.pool.clone(),
            audit: self.audit.clone(),
            bus: self.bus.clone(),
            end_signal: self.ticker.end_signal().clone(),
        }
    }

    fn rule(&self, config: GlimmerEventConfig, seed: u64) -> Box<GlimmerEventRule> {
        Box::new(GlimmerEventRule::new(
            config,
            self.services(),
            StdRng::seed_from_u64(seed),
        ))
    }
}

#[test]
fn test_event_burns_glimmer_and_reports_once() {
    let mut host = Host::new(500);
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    host.bus.subscribe(move |e: &GlimmerEventEnded| sink.borrow_mut().push(e.clone()));

    let config = GlimmerEventConfig::new("Test", 10, 20, "Test").unwrap();
    let rule = host.rule(config, 3);
    host.ticker.add_rule(rule).unwrap();
    host.ticker.start_rule("Test").unwrap();

    // 0.6s: still running
    for _ in 0..6 {
        host.ticker.update(0.1);
    }
    assert!(host.ticker.is_running("Test"));
    assert!(received.borrow().is_empty());

    // past one second: ended exactly once
    for _ in 0..10 {
        host.ticker.update(0.1);
    }
    assert!(!host.ticker.is_running("Test"));

    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message, "Test");
    assert!((10..20).contains(&received[0].glimmer_burned));
    assert_eq!(host.pool.borrow().glimmer(), 500 - received[0].glimmer_burned);

    let audit = host.audit.borrow();
    let types: Vec<LogType> = audit.entries().iter().map(|e| e.log_type).collect();
    assert_eq!(
        types,
        [LogType::EventAnnounced, LogType::EventStarted, LogType::EventStopped]
    );
    assert_eq!(audit.entries()[0].message, "Event added / announced: Test");
    assert_eq!(audit.entries()[1].impact, LogImpact::High);
    assert_eq!(audit.entries()[2].message, "Event ended: Test");
}

#[test]
fn test_forced_end_and_timeout_end_once() {
    let mut host = Host::new(500);
    let config = GlimmerEventConfig::new("Race", 10, 11, "Race").unwrap();
    host.ticker.add_rule(host.rule(config, 1)).unwrap();
    host.ticker.start_rule("Race").unwrap();

    // an external end request lands in the same tick the rule times out
    host.ticker.end_signal().request_end("Race");
    host.ticker.update(2.0);
    assert!(!host.ticker.end_rule("Race"));

    assert_eq!(host.bus.raised_count(), 1);
    assert_eq!(host.pool.borrow().glimmer(), 490);
    assert_eq!(host.ticker.ended_total(), 1);
}

#[test]
fn test_glimmer_never_drops_below_zero() {
    let mut host = Host::new(5);
    let config = GlimmerEventConfig::new("Drain", 50, 60, "Drained").unwrap();
    host.ticker.add_rule(host.rule(config, 1)).unwrap();
    host.ticker.start_rule("Drain").unwrap();
    host.ticker.update(1.5);

    assert_eq!(host.pool.borrow().glimmer(), 0);
    assert_eq!(host.pool.borrow().tier(), GlimmerTier::Minimal);
}

/// A concrete event composed over the base rule: on start it marks a random
/// tile on the station as scorched.
struct ScorchEvent {
    base: GlimmerEventRule,
    map: Rc<RefCell<StationMap>>,
    scorched: Rc<RefCell<Vec<GridCoordinates>>>,
}

impl StationEvent for ScorchEvent {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn state(&self) -> RuleState {
        self.base.state()
    }

    fn added(&mut self) {
        self.base.added();
    }

    fn started(&mut self) {
        self.base.started();
        let map = self.map.borrow();
        if let Some(target) = self.base.try_find_random_tile(&*map, &*map) {
            self.scorched.borrow_mut().push(target.coordinates);
        }
    }

    fn update(&mut self, frame_time: f32) {
        self.base.update(frame_time);
    }

    fn ended(&mut self) {
        self.base.ended();
    }
}

#[test]
fn test_composed_event_keeps_base_behavior() {
    let mut engine = StationEventEngine::new(11);
    engine.set_glimmer(800);

    let mut map = StationMap::new();
    let station = map.spawn_station("Outpost");
    let mut grid = MapGrid::new(Vec2::ZERO);
    for x in 0..4 {
        for y in 0..4 {
            grid.set_tile(Vec2i::new(x, y), TileKind::Floor);
        }
    }
    map.spawn_grid(station, grid);

    let scorched = Rc::new(RefCell::new(Vec::new()));
    let config = GlimmerEventConfig::new("Scorch", 20, 30, "Scorched").unwrap();
    let rng = engine.rule_rng();
    let event = ScorchEvent {
        base: GlimmerEventRule::new(config, engine.services(), rng),
        map: Rc::new(RefCell::new(map)),
        scorched: scorched.clone(),
    };

    engine.add_rule(Box::new(event)).unwrap();
    assert_eq!(scorched.borrow().len(), 1);
    let spot = scorched.borrow()[0].position;
    assert!((0.5..4.0).contains(&spot.x) && (0.5..4.0).contains(&spot.y));

    for _ in 0..90 {
        engine.update(1.0 / 60.0);
    }
    assert!(!engine.is_running("Scorch"));
    let reports = engine.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Scorched");
    assert_eq!(engine.glimmer(), 800 - reports[0].glimmer_burned);
}

struct OneGrid {
    station: Entity,
    grid: Entity,
}

impl StationRegistry for OneGrid {
    fn stations(&self) -> Vec<Entity> {
        vec![self.station]
    }

    fn station_grids(&self, _station: Entity) -> Vec<Entity> {
        vec![self.grid]
    }

    fn grid_placement(&self, _grid: Entity) -> Option<GridPlacement> {
        Some(GridPlacement {
            world_aabb: glimmer_core::components::Box2::new(0.0, 0.0, 16.0, 16.0),
            world_position: Vec2::ZERO,
        })
    }
}

/// Every tile is an interior wall
#[derive(Default)]
struct WalledIn {
    space_checks: Cell<usize>,
    blocked_checks: Cell<usize>,
}

impl TileQuery for WalledIn {
    fn is_tile_space(&self, _grid: Entity, _placement: &GridPlacement, _tile: Vec2i) -> bool {
        self.space_checks.set(self.space_checks.get() + 1);
        false
    }

    fn is_tile_air_blocked(&self, _grid: Entity, _placement: &GridPlacement, _tile: Vec2i) -> bool {
        self.blocked_checks.set(self.blocked_checks.get() + 1);
        true
    }
}

#[test]
fn test_search_gives_up_after_ten_attempts() {
    let mut world = hecs::World::new();
    let registry = OneGrid {
        station: world.spawn(()),
        grid: world.spawn(()),
    };
    let tiles = WalledIn::default();
    let mut rng = StdRng::seed_from_u64(4);

    assert!(try_find_random_tile(&registry, &tiles, &mut rng).is_none());
    assert_eq!(tiles.space_checks.get(), TILE_SEARCH_ATTEMPTS);
    assert_eq!(tiles.blocked_checks.get(), TILE_SEARCH_ATTEMPTS);
}

#[test]
fn test_engine_session_with_builtin_catalog() {
    let catalog = EventCatalog::builtin().unwrap();
    let mut engine = StationEventEngine::with_catalog(catalog, 2024);
    engine.generate(&StationConfig::default());
    engine.set_glimmer(1000);

    let mut started = 0;
    for _ in 0..20 {
        if engine.start_random_event().unwrap().is_some() {
            started += 1;
        }
        for _ in 0..90 {
            engine.update(1.0 / 60.0);
        }
    }

    assert!(started > 0);
    assert!(engine.running_events().is_empty());
    assert_eq!(engine.reports().len(), started);
    let burned: i32 = engine.reports().iter().map(|r| r.glimmer_burned).sum();
    assert_eq!(engine.glimmer(), (1000 - burned).max(0));
}
