//! Event catalog - per-event-type configuration loaded from JSON.
//!
//! Each entry is a [`RuleConfiguration`]. Glimmer events carry their debit
//! range, report text and the glimmer window in which they may be picked.
//! Any other rule kind is kept as [`RuleConfiguration::Generic`] so a
//! controller built from it still audits its lifecycle but does nothing else.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::systems::GLIMMER_MAX;

/// Event catalog shipped with the crate
pub const BUILTIN_EVENT_CATALOG: &str = include_str!("../../../data/glimmer_events.json");

fn default_burn_lower() -> i32 {
    25
}

fn default_burn_upper() -> i32 {
    70
}

fn default_maximum_glimmer() -> i32 {
    GLIMMER_MAX
}

fn default_weight() -> f32 {
    5.0
}

/// Configuration for one glimmer-consuming station event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlimmerEventConfig {
    pub id: String,
    /// Inclusive lower bound of the glimmer debit
    #[serde(default = "default_burn_lower")]
    pub glimmer_burn_lower: i32,
    /// Exclusive upper bound of the glimmer debit
    #[serde(default = "default_burn_upper")]
    pub glimmer_burn_upper: i32,
    /// Summary broadcast when the event ends
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub minimum_glimmer: i32,
    #[serde(default = "default_maximum_glimmer")]
    pub maximum_glimmer: i32,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl GlimmerEventConfig {
    /// Build a validated config with default window and weight
    pub fn new(
        id: impl Into<String>,
        glimmer_burn_lower: i32,
        glimmer_burn_upper: i32,
        report: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            id: id.into(),
            glimmer_burn_lower,
            glimmer_burn_upper,
            report: report.into(),
            minimum_glimmer: 0,
            maximum_glimmer: default_maximum_glimmer(),
            weight: default_weight(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_window(mut self, minimum_glimmer: i32, maximum_glimmer: i32) -> Self {
        self.minimum_glimmer = minimum_glimmer;
        self.maximum_glimmer = maximum_glimmer;
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::MissingId);
        }
        if self.glimmer_burn_lower < 0 || self.glimmer_burn_lower > self.glimmer_burn_upper {
            return Err(ConfigError::InvalidBurnRange {
                id: self.id.clone(),
                lower: self.glimmer_burn_lower,
                upper: self.glimmer_burn_upper,
            });
        }
        if self.minimum_glimmer > self.maximum_glimmer {
            return Err(ConfigError::InvalidWindow {
                id: self.id.clone(),
                minimum: self.minimum_glimmer,
                maximum: self.maximum_glimmer,
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(ConfigError::InvalidWeight {
                id: self.id.clone(),
                weight: self.weight,
            });
        }
        Ok(())
    }

    /// Can this event be picked at the given glimmer level?
    pub fn is_eligible(&self, glimmer: i32) -> bool {
        self.weight > 0.0 && glimmer >= self.minimum_glimmer && glimmer <= self.maximum_glimmer
    }

    /// Draw a debit from `[lower, upper)`. An empty range yields `lower`.
    pub fn roll_burn(&self, rng: &mut impl Rng) -> i32 {
        let lower = self.glimmer_burn_lower.max(0);
        let upper = self.glimmer_burn_upper;
        if upper <= lower {
            return lower.min(upper.max(0));
        }
        rng.gen_range(lower..upper)
    }
}

/// Configuration handed to a rule controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfiguration {
    Glimmer(GlimmerEventConfig),
    /// A rule kind this engine does not drive
    Generic { id: String },
}

impl RuleConfiguration {
    pub fn id(&self) -> &str {
        match self {
            RuleConfiguration::Glimmer(config) => &config.id,
            RuleConfiguration::Generic { id } => id,
        }
    }

    pub fn as_glimmer(&self) -> Option<&GlimmerEventConfig> {
        match self {
            RuleConfiguration::Glimmer(config) => Some(config),
            RuleConfiguration::Generic { .. } => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            RuleConfiguration::Glimmer(config) => config.validate(),
            RuleConfiguration::Generic { id } if id.trim().is_empty() => {
                Err(ConfigError::MissingId)
            }
            RuleConfiguration::Generic { .. } => Ok(()),
        }
    }
}

impl From<GlimmerEventConfig> for RuleConfiguration {
    fn from(config: GlimmerEventConfig) -> Self {
        RuleConfiguration::Glimmer(config)
    }
}

/// Ordered, validated set of event configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCatalog {
    pub events: Vec<RuleConfiguration>,
}

impl EventCatalog {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json_str(BUILTIN_EVENT_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let catalog: EventCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        log::debug!(target: "stationevents", "loaded {} event configurations", catalog.events.len());
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_events(events: Vec<RuleConfiguration>) -> Result<Self, ConfigError> {
        let catalog = Self { events };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for event in &self.events {
            event.validate()?;
            if !seen.insert(event.id()) {
                return Err(ConfigError::Duplicate {
                    id: event.id().to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RuleConfiguration> {
        self.events.iter().find(|e| e.id() == id)
    }

    pub fn glimmer_events(&self) -> impl Iterator<Item = &GlimmerEventConfig> {
        self.events.iter().filter_map(RuleConfiguration::as_glimmer)
    }

    /// Glimmer events that may run at the current glimmer level
    pub fn eligible(&self, glimmer: i32) -> impl Iterator<Item = &GlimmerEventConfig> {
        self.glimmer_events().filter(move |e| e.is_eligible(glimmer))
    }

    /// Weighted pick among eligible events
    pub fn pick_weighted(&self, glimmer: i32, rng: &mut impl Rng) -> Option<&GlimmerEventConfig> {
        self.pick_weighted_by(glimmer, rng, |_| true)
    }

    /// Weighted pick among eligible events that also pass `allow`
    pub fn pick_weighted_by(
        &self,
        glimmer: i32,
        rng: &mut impl Rng,
        allow: impl Fn(&GlimmerEventConfig) -> bool,
    ) -> Option<&GlimmerEventConfig> {
        let candidates: Vec<&GlimmerEventConfig> =
            self.eligible(glimmer).filter(|e| allow(e)).collect();
        let total: f32 = candidates.iter().map(|e| e.weight).sum();
        if total <= 0.0 {
            return None;
        }

        let mut roll = rng.gen_range(0.0..total);
        let mut last = None;
        for event in candidates {
            if roll < event.weight {
                return Some(event);
            }
            roll -= event.weight;
            last = Some(event);
        }
        // float drift can leave a sliver past the final bucket
        last
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse event catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read event catalog from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("event configuration is missing an id")]
    MissingId,
    #[error("event {id}: glimmer burn range [{lower}, {upper}) is invalid")]
    InvalidBurnRange { id: String, lower: i32, upper: i32 },
    #[error("event {id}: glimmer window {minimum}..={maximum} is invalid")]
    InvalidWindow { id: String, minimum: i32, maximum: i32 },
    #[error("event {id}: weight {weight} must be finite and non-negative")]
    InvalidWeight { id: String, weight: f32 },
    #[error("duplicate event id {id}")]
    Duplicate { id: String },
}
