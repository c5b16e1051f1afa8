//! Game ticker - hosts running rules and ends each one exactly once

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use super::rule::StationEvent;

/// Queue of rule ids that asked to be ended
#[derive(Debug, Clone, Default)]
pub struct RuleEndSignal {
    queue: Rc<RefCell<Vec<String>>>,
}

impl RuleEndSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_end(&self, rule_id: &str) {
        log::debug!(target: "stationevents", "end requested for {}", rule_id);
        self.queue.borrow_mut().push(rule_id.to_string());
    }

    /// Requests not yet processed
    pub fn pending(&self) -> Vec<String> {
        self.queue.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Drop pending requests for `rule_id` so they cannot reach a later
    /// rule hosted under the same id
    pub fn cancel(&self, rule_id: &str) -> usize {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|id| id != rule_id);
        before - queue.len()
    }

    /// Drain all pending requests
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickerError {
    #[error("rule {0} is already running")]
    AlreadyRunning(String),
    #[error("no running rule named {0}")]
    UnknownRule(String),
}

/// Hosts rules from add to end
#[derive(Default)]
pub struct GameTicker {
    rules: Vec<Box<dyn StationEvent>>,
    end_signal: RuleEndSignal,
    ended_total: usize,
}

impl GameTicker {
    pub fn new(end_signal: RuleEndSignal) -> Self {
        Self {
            rules: Vec::new(),
            end_signal,
            ended_total: 0,
        }
    }

    /// The signal rules should be built with
    pub fn end_signal(&self) -> &RuleEndSignal {
        &self.end_signal
    }

    /// Host a rule and announce it
    pub fn add_rule(&mut self, mut rule: Box<dyn StationEvent>) -> Result<(), TickerError> {
        if self.is_running(rule.id()) {
            return Err(TickerError::AlreadyRunning(rule.id().to_string()));
        }
        rule.added();
        log::info!(target: "stationevents", "rule {} added", rule.id());
        self.rules.push(rule);
        Ok(())
    }

    pub fn start_rule(&mut self, rule_id: &str) -> Result<(), TickerError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id() == rule_id)
            .ok_or_else(|| TickerError::UnknownRule(rule_id.to_string()))?;
        rule.started();
        Ok(())
    }

    /// Tick every hosted rule, then end those that asked for it
    pub fn update(&mut self, frame_time: f32) {
        for rule in self.rules.iter_mut() {
            rule.update(frame_time);
        }
        self.process_end_requests();
    }

    /// End every rule currently waiting in the signal queue
    pub fn process_end_requests(&mut self) -> usize {
        let mut ended = 0;
        loop {
            let requests = self.end_signal.take();
            if requests.is_empty() {
                break;
            }
            for rule_id in requests {
                if self.end_rule(&rule_id) {
                    ended += 1;
                }
            }
        }
        ended
    }

    /// End and drop a hosted rule. Returns `false` if it is not hosted,
    /// so a second end for the same rule does nothing.
    pub fn end_rule(&mut self, rule_id: &str) -> bool {
        let Some(index) = self.rules.iter().position(|r| r.id() == rule_id) else {
            log::debug!(target: "stationevents", "ignoring end for {}, not running", rule_id);
            return false;
        };
        let mut rule = self.rules.remove(index);
        rule.ended();
        self.end_signal.cancel(rule_id);
        self.ended_total += 1;
        log::info!(target: "stationevents", "rule {} ended", rule_id);
        true
    }

    pub fn end_all(&mut self) -> usize {
        let ids: Vec<String> = self.rules.iter().map(|r| r.id().to_string()).collect();
        ids.iter().filter(|id| self.end_rule(id)).count()
    }

    pub fn is_running(&self, rule_id: &str) -> bool {
        self.rules.iter().any(|r| r.id() == rule_id)
    }

    pub fn running_rules(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id())
    }

    pub fn rule(&self, rule_id: &str) -> Option<&dyn StationEvent> {
        self.rules
            .iter()
            .find(|r| r.id() == rule_id)
            .map(|r| r.as_ref())
    }

    pub fn running_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules ended since this ticker was created
    pub fn ended_total(&self) -> usize {
        self.ended_total
    }
}
