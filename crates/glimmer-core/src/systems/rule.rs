//! Glimmer event rule - the lifecycle controller every station event obeys
//!
//! A rule moves strictly forward through `Pending → Announced → Active →
//! Ended`. The base controller owns the side effects every event must have:
//! audit entries on each transition, a one-shot end request once the rule
//! has run for [`RULE_DURATION`] seconds, and on end a glimmer debit plus a
//! [`GlimmerEventEnded`] report raised on the local bus.
//!
//! Concrete events implement [`StationEvent`] by wrapping a
//! [`GlimmerEventRule`] and calling its hooks before their own behavior.

use rand::rngs::StdRng;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::audit::{LogImpact, LogType, SharedAuditLog};
use super::ledger::SharedLedger;
use super::ticker::RuleEndSignal;
use super::tile_search::{try_find_random_tile, StationRegistry, TileQuery, TileTarget};
use crate::config::{GlimmerEventConfig, RuleConfiguration};

/// Seconds a rule runs before it asks to be ended
pub const RULE_DURATION: f32 = 1.0;

/// Lifecycle position of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleState {
    /// Constructed, not yet added
    Pending,
    /// Added and announced
    Announced,
    /// Started and ticking
    Active,
    /// Terminal
    Ended,
}

/// Raised once when a glimmer event ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlimmerEventEnded {
    pub message: String,
    pub glimmer_burned: i32,
}

impl GlimmerEventEnded {
    pub fn new(message: impl Into<String>, glimmer_burned: i32) -> Self {
        Self {
            message: message.into(),
            glimmer_burned,
        }
    }
}

type Listener = Box<dyn FnMut(&GlimmerEventEnded)>;

/// Synchronous local broadcast of [`GlimmerEventEnded`].
///
/// Listeners run in subscription order. A listener may subscribe or raise
/// again; nested reports are delivered after the current one, and new
/// listeners only hear reports raised after they subscribed.
#[derive(Default)]
pub struct GlimmerEventBus {
    listeners: RefCell<Vec<Listener>>,
    queued: RefCell<VecDeque<GlimmerEventEnded>>,
    dispatching: Cell<bool>,
    history: RefCell<Vec<GlimmerEventEnded>>,
}

impl GlimmerEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn subscribe(&self, listener: impl FnMut(&GlimmerEventEnded) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub fn raise(&self, event: GlimmerEventEnded) {
        self.queued.borrow_mut().push_back(event);
        if self.dispatching.replace(true) {
            return;
        }

        loop {
            let Some(event) = self.queued.borrow_mut().pop_front() else {
                break;
            };
            self.history.borrow_mut().push(event.clone());

            // listeners are taken out while they run so they can reach the bus
            let mut listeners = std::mem::take(&mut *self.listeners.borrow_mut());
            for listener in listeners.iter_mut() {
                listener(&event);
            }
            let mut slot = self.listeners.borrow_mut();
            listeners.append(&mut slot);
            *slot = listeners;
        }

        self.dispatching.set(false);
    }

    /// Every report raised and not yet drained, oldest first
    pub fn history(&self) -> Vec<GlimmerEventEnded> {
        self.history.borrow().clone()
    }

    /// Remove and return the recorded reports
    pub fn drain_history(&self) -> Vec<GlimmerEventEnded> {
        std::mem::take(&mut *self.history.borrow_mut())
    }

    pub fn raised_count(&self) -> usize {
        self.history.borrow().len()
    }
}

/// Handles a rule needs to reach the rest of the simulation
#[derive(Clone)]
pub struct RuleServices {
    pub ledger: SharedLedger,
    pub audit: SharedAuditLog,
    pub bus: Rc<GlimmerEventBus>,
    pub end_signal: RuleEndSignal,
}

/// The four lifecycle hooks a host drives
pub trait StationEvent {
    fn id(&self) -> &str;

    fn state(&self) -> RuleState;

    /// Called once as soon as the event is added, for announcements
    fn added(&mut self);

    /// Called once when the event actually begins
    fn started(&mut self);

    /// Called every tick while the rule is hosted
    fn update(&mut self, frame_time: f32);

    /// Called once when the event ends for any reason
    fn ended(&mut self);
}

/// Base controller for glimmer-consuming station events
pub struct GlimmerEventRule {
    configuration: RuleConfiguration,
    state: RuleState,
    /// How long the event has been ticking, in seconds
    elapsed: f32,
    end_requested: bool,
    rng: StdRng,
    services: RuleServices,
}

impl GlimmerEventRule {
    pub fn new(config: GlimmerEventConfig, services: RuleServices, rng: StdRng) -> Self {
        Self::from_configuration(RuleConfiguration::Glimmer(config), services, rng)
    }

    /// Build from a dynamically sourced configuration.
    /// Non-glimmer configurations only produce audit entries.
    pub fn from_configuration(
        configuration: RuleConfiguration,
        services: RuleServices,
        rng: StdRng,
    ) -> Self {
        Self {
            configuration,
            state: RuleState::Pending,
            elapsed: 0.0,
            end_requested: false,
            rng,
            services,
        }
    }

    pub fn configuration(&self) -> &RuleConfiguration {
        &self.configuration
    }

    pub fn glimmer_config(&self) -> Option<&GlimmerEventConfig> {
        self.configuration.as_glimmer()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Added and not yet ended
    pub fn is_active(&self) -> bool {
        matches!(self.state, RuleState::Announced | RuleState::Active)
    }

    pub fn end_requested(&self) -> bool {
        self.end_requested
    }

    /// Random source for composed behaviors
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn services(&self) -> &RuleServices {
        &self.services
    }

    /// Ask the host to end this rule. Only the first request is sent.
    pub fn force_end_self(&mut self) {
        if self.end_requested || self.state == RuleState::Ended {
            return;
        }
        self.end_requested = true;
        self.services.end_signal.request_end(self.configuration.id());
    }

    /// Pick a usable tile with this rule's random source
    pub fn try_find_random_tile(
        &mut self,
        registry: &impl StationRegistry,
        tiles: &impl TileQuery,
    ) -> Option<TileTarget> {
        try_find_random_tile(registry, tiles, &mut self.rng)
    }

    fn audit(&self, log_type: LogType, impact: LogImpact, message: String) {
        self.services.audit.borrow_mut().add(log_type, impact, message);
    }
}

impl StationEvent for GlimmerEventRule {
    fn id(&self) -> &str {
        self.configuration.id()
    }

    fn state(&self) -> RuleState {
        self.state
    }

    fn added(&mut self) {
        if self.state != RuleState::Pending {
            log::warn!(
                target: "stationevents",
                "rule {} added from {:?}",
                self.id(),
                self.state
            );
            return;
        }
        self.state = RuleState::Announced;
        self.audit(
            LogType::EventAnnounced,
            LogImpact::Medium,
            format!("Event added / announced: {}", self.id()),
        );
    }

    fn started(&mut self) {
        if self.state != RuleState::Announced {
            log::warn!(
                target: "stationevents",
                "rule {} started from {:?}",
                self.id(),
                self.state
            );
            return;
        }
        self.state = RuleState::Active;
        self.audit(
            LogType::EventStarted,
            LogImpact::High,
            format!("Event started: {}", self.id()),
        );
    }

    fn update(&mut self, frame_time: f32) {
        if self.state != RuleState::Active || self.glimmer_config().is_none() {
            return;
        }

        // NaN and negative deltas add nothing
        self.elapsed += frame_time.max(0.0);
        if self.elapsed > RULE_DURATION {
            self.force_end_self();
        }
    }

    fn ended(&mut self) {
        let previous = self.state;
        if previous == RuleState::Ended {
            return;
        }
        self.state = RuleState::Ended;
        if previous == RuleState::Pending {
            // never announced, nothing to close out
            return;
        }

        self.audit(
            LogType::EventStopped,
            LogImpact::Medium,
            format!("Event ended: {}", self.id()),
        );

        let Some(config) = self.configuration.as_glimmer() else {
            return;
        };

        let glimmer_burned = config.roll_burn(&mut self.rng);
        self.services
            .ledger
            .borrow_mut()
            .add_to_glimmer(-glimmer_burned);
        log::info!(
            target: "stationevents",
            "{} ended, burned {} glimmer",
            config.id,
            glimmer_burned
        );

        let report = GlimmerEventEnded::new(config.report.clone(), glimmer_burned);
        self.services.bus.raise(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{AdminLog, GlimmerLedger, GlimmerPool};
    use rand::SeedableRng;
    use std::cell::RefCell;

    struct Harness {
        pool: Rc<RefCell<GlimmerPool>>,
        audit: Rc<RefCell<AdminLog>>,
        bus: Rc<GlimmerEventBus>,
        end_signal: RuleEndSignal,
    }

    impl Harness {
        fn new(glimmer: i32) -> Self {
            Self {
                pool: GlimmerPool::shared(glimmer),
                audit: AdminLog::shared(),
                bus: GlimmerEventBus::shared(),
                end_signal: RuleEndSignal::new(),
            }
        }

        fn services(&self) -> RuleServices {
            RuleServices {
                ledger: self.pool.clone(),
                audit: self.audit.clone(),
                bus: self.bus.clone(),
                end_signal: self.end_signal.clone(),
            }
        }

        fn rule(&self, lower: i32, upper: i32, report: &str) -> GlimmerEventRule {
            let config = GlimmerEventConfig::new("TestEvent", lower, upper, report).unwrap();
            GlimmerEventRule::new(config, self.services(), StdRng::seed_from_u64(42))
        }

        fn glimmer(&self) -> i32 {
            self.pool.borrow().glimmer()
        }
    }

    #[test]
    fn test_lifecycle_states() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        assert_eq!(rule.state(), RuleState::Pending);
        assert!(!rule.is_active());

        rule.added();
        assert_eq!(rule.state(), RuleState::Announced);
        assert!(rule.is_active());

        rule.started();
        assert_eq!(rule.state(), RuleState::Active);

        rule.ended();
        assert_eq!(rule.state(), RuleState::Ended);
        assert!(!rule.is_active());
    }

    #[test]
    fn test_audit_entries() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();
        rule.ended();

        let audit = h.audit.borrow();
        let entries = audit.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].log_type, LogType::EventAnnounced);
        assert_eq!(entries[0].message, "Event added / announced: TestEvent");
        assert_eq!(entries[1].log_type, LogType::EventStarted);
        assert_eq!(entries[1].impact, LogImpact::High);
        assert_eq!(entries[1].message, "Event started: TestEvent");
        assert_eq!(entries[2].log_type, LogType::EventStopped);
        assert_eq!(entries[2].message, "Event ended: TestEvent");
    }

    #[test]
    fn test_ended_debits_ledger_once() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();
        rule.ended();

        let reports = h.bus.history();
        assert_eq!(reports.len(), 1);
        let burned = reports[0].glimmer_burned;
        assert!((10..20).contains(&burned));
        assert_eq!(h.glimmer(), 500 - burned);

        rule.ended();
        assert_eq!(h.bus.raised_count(), 1);
        assert_eq!(h.glimmer(), 500 - burned);
        assert_eq!(h.audit.borrow().entries_of(LogType::EventStopped).count(), 1);
    }

    #[test]
    fn test_update_ignored_outside_active() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");

        rule.update(5.0);
        assert_eq!(rule.elapsed(), 0.0);

        rule.added();
        rule.update(5.0);
        assert_eq!(rule.elapsed(), 0.0);
        assert!(h.end_signal.is_empty());

        rule.started();
        rule.update(0.25);
        assert_eq!(rule.elapsed(), 0.25);

        rule.ended();
        rule.update(5.0);
        assert_eq!(rule.elapsed(), 0.25);
    }

    #[test]
    fn test_timeout_signals_once() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();

        let mut last = 0.0;
        for _ in 0..10 {
            rule.update(0.1);
            assert!(rule.elapsed() >= last);
            last = rule.elapsed();
        }
        // f32 rounding decides whether ten 0.1 steps cross 1.0
        rule.update(0.05);
        assert!(rule.elapsed() > RULE_DURATION);
        assert_eq!(h.end_signal.pending(), vec!["TestEvent".to_string()]);

        for _ in 0..30 {
            rule.update(0.1);
        }
        assert_eq!(h.end_signal.pending().len(), 1);
    }

    #[test]
    fn test_exactly_one_second_does_not_signal() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();
        rule.update(1.0);
        assert!(h.end_signal.is_empty());
        rule.update(0.001);
        assert_eq!(h.end_signal.pending().len(), 1);
    }

    #[test]
    fn test_negative_delta_keeps_elapsed_monotonic() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();
        rule.update(0.5);
        rule.update(-3.0);
        rule.update(f32::NAN);
        assert_eq!(rule.elapsed(), 0.5);
    }

    #[test]
    fn test_force_end_and_timeout_share_signal() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.added();
        rule.started();
        rule.force_end_self();
        rule.update(2.0);
        rule.force_end_self();
        assert_eq!(h.end_signal.pending().len(), 1);
        assert!(rule.end_requested());
    }

    #[test]
    fn test_generic_configuration_only_audits() {
        let h = Harness::new(500);
        let mut rule = GlimmerEventRule::from_configuration(
            RuleConfiguration::Generic {
                id: "Meteors".into(),
            },
            h.services(),
            StdRng::seed_from_u64(1),
        );
        rule.added();
        rule.started();
        rule.update(5.0);
        assert_eq!(rule.elapsed(), 0.0);
        assert!(h.end_signal.is_empty());

        rule.ended();
        assert_eq!(h.glimmer(), 500);
        assert_eq!(h.bus.raised_count(), 0);
        assert_eq!(h.audit.borrow().entries().len(), 3);
    }

    #[test]
    fn test_pending_end_is_silent() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.ended();
        assert_eq!(rule.state(), RuleState::Ended);
        assert_eq!(h.glimmer(), 500);
        assert!(h.audit.borrow().entries().is_empty());

        rule.added();
        assert_eq!(rule.state(), RuleState::Ended);
    }

    #[test]
    fn test_started_before_added_is_ignored() {
        let h = Harness::new(500);
        let mut rule = h.rule(10, 20, "Test");
        rule.started();
        assert_eq!(rule.state(), RuleState::Pending);
        assert!(h.audit.borrow().entries().is_empty());
    }

    #[test]
    fn test_listeners_receive_report() {
        let h = Harness::new(500);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        h.bus.subscribe(move |ev| sink.borrow_mut().push(ev.clone()));

        // listener observes the ledger already debited
        let pool = h.pool.clone();
        let observed = Rc::new(RefCell::new(0));
        let observed_sink = observed.clone();
        h.bus
            .subscribe(move |_| *observed_sink.borrow_mut() = pool.borrow().glimmer());

        let mut rule = h.rule(10, 20, "Storm passed");
        rule.added();
        rule.started();
        rule.ended();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "Storm passed");
        assert_eq!(*observed.borrow(), h.glimmer());
    }

    #[test]
    fn test_listener_can_reach_bus_while_running() {
        let bus = GlimmerEventBus::shared();
        let order = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = bus.clone();
        let sink = order.clone();
        bus.subscribe(move |ev| {
            sink.borrow_mut().push(ev.message.clone());
            if ev.message == "first" {
                let late_sink = sink.clone();
                inner_bus.subscribe(move |ev| late_sink.borrow_mut().push(format!("late {}", ev.message)));
                inner_bus.raise(GlimmerEventEnded::new("nested", 1));
            }
        });

        bus.raise(GlimmerEventEnded::new("first", 5));

        assert_eq!(*order.borrow(), ["first", "nested", "late nested"]);
        assert_eq!(bus.raised_count(), 2);
    }

    #[test]
    fn test_drain_history() {
        let bus = GlimmerEventBus::new();
        bus.raise(GlimmerEventEnded::new("a", 1));
        bus.raise(GlimmerEventEnded::new("b", 2));

        let drained = bus.drain_history();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[1].glimmer_burned, 2);
        assert_eq!(bus.raised_count(), 0);
        assert!(bus.history().is_empty());
    }
}
