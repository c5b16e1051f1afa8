//! Glimmer ledger - the shared resource events draw down when they end

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Hard ceiling of the glimmer pool
pub const GLIMMER_MAX: i32 = 1000;

/// Anything that can hold the global glimmer total
pub trait GlimmerLedger {
    fn glimmer(&self) -> i32;

    /// Adjust the total by a signed delta
    fn add_to_glimmer(&mut self, delta: i32);
}

/// Handle given to rule controllers
pub type SharedLedger = Rc<RefCell<dyn GlimmerLedger>>;

/// Coarse bands of the glimmer total
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GlimmerTier {
    Minimal,
    Low,
    Moderate,
    High,
    Dangerous,
    Critical,
}

impl GlimmerTier {
    pub fn from_glimmer(glimmer: i32) -> Self {
        match glimmer {
            i32::MIN..=49 => GlimmerTier::Minimal,
            50..=399 => GlimmerTier::Low,
            400..=599 => GlimmerTier::Moderate,
            600..=699 => GlimmerTier::High,
            700..=899 => GlimmerTier::Dangerous,
            _ => GlimmerTier::Critical,
        }
    }
}

/// Station-wide glimmer total (singleton), clamped to `0..=GLIMMER_MAX`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlimmerPool {
    glimmer: i32,
}

impl GlimmerPool {
    pub fn new(glimmer: i32) -> Self {
        Self {
            glimmer: glimmer.clamp(0, GLIMMER_MAX),
        }
    }

    pub fn shared(glimmer: i32) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(glimmer)))
    }

    pub fn set_glimmer(&mut self, glimmer: i32) {
        self.glimmer = glimmer.clamp(0, GLIMMER_MAX);
    }

    pub fn tier(&self) -> GlimmerTier {
        GlimmerTier::from_glimmer(self.glimmer)
    }
}

impl GlimmerLedger for GlimmerPool {
    fn glimmer(&self) -> i32 {
        self.glimmer
    }

    fn add_to_glimmer(&mut self, delta: i32) {
        self.glimmer = self.glimmer.saturating_add(delta).clamp(0, GLIMMER_MAX);
    }
}
