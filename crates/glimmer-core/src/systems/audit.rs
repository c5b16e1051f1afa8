//! Admin audit log - records rule lifecycle milestones

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Category of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogType {
    EventAnnounced,
    EventStarted,
    EventStopped,
}

/// How much an entry matters to an administrator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogImpact {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub log_type: LogType,
    pub impact: LogImpact,
    pub message: String,
}

pub trait AuditLog {
    fn add(&mut self, log_type: LogType, impact: LogImpact, message: String);
}

pub type SharedAuditLog = Rc<RefCell<dyn AuditLog>>;

/// In-memory audit log that mirrors every entry to the `log` facade
#[derive(Debug, Clone, Default)]
pub struct AdminLog {
    entries: Vec<AuditEntry>,
}

impl AdminLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn entries_of(&self, log_type: LogType) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.log_type == log_type)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl LogImpact {
    /// Level an entry of this impact is mirrored at. Routine lifecycle
    /// entries stay at `info`; only extreme ones warn.
    pub fn log_level(self) -> log::Level {
        match self {
            LogImpact::Low => log::Level::Debug,
            LogImpact::Medium | LogImpact::High => log::Level::Info,
            LogImpact::Extreme => log::Level::Warn,
        }
    }
}

impl AuditLog for AdminLog {
    fn add(&mut self, log_type: LogType, impact: LogImpact, message: String) {
        log::log!(target: "stationevents", impact.log_level(), "[{:?}] {}", log_type, message);
        self.entries.push(AuditEntry {
            log_type,
            impact,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_log_records_in_order() {
        let mut log = AdminLog::new();
        log.add(LogType::EventAnnounced, LogImpact::Medium, "a".into());
        log.add(LogType::EventStarted, LogImpact::High, "b".into());
        log.add(LogType::EventStopped, LogImpact::Medium, "c".into());

        let messages: Vec<_> = log.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["a", "b", "c"]);
        assert_eq!(log.entries_of(LogType::EventStarted).count(), 1);
        assert_eq!(log.entries()[1].impact, LogImpact::High);

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_lifecycle_impacts_do_not_warn() {
        assert_eq!(LogImpact::Low.log_level(), log::Level::Debug);
        assert_eq!(LogImpact::Medium.log_level(), log::Level::Info);
        assert_eq!(LogImpact::High.log_level(), log::Level::Info);
        assert_eq!(LogImpact::Extreme.log_level(), log::Level::Warn);
    }
}
