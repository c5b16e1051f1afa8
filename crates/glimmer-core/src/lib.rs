//! Glimmer Core - Station Event Engine
//!
//! Drives glimmer-consuming station events through a strict lifecycle and
//! debits a shared glimmer pool when each event ends.
//!
//! # Architecture
//!
//! Stations and grids live in a `hecs` world:
//! - **Components**: Plain data attached to station and grid entities (MapGrid, StationData)
//! - **Systems**: The rule lifecycle, the ticker hosting rules, the glimmer ledger,
//!   the admin log and the randomized tile search
//! - **Config**: The event catalog, loaded from JSON
//!
//! # Example
//!
//! ```rust,no_run
//! use glimmer_core::prelude::*;
//! use glimmer_core::generation::StationConfig;
//!
//! let catalog = EventCatalog::builtin().unwrap();
//! let mut engine = StationEventEngine::with_catalog(catalog, 42);
//! engine.generate(&StationConfig::default());
//! engine.set_glimmer(500);
//!
//! engine.start_event("NoosphericZap").unwrap();
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod generation;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::{EventCatalog, GlimmerEventConfig, RuleConfiguration};
    pub use crate::engine::{EngineError, StationEventEngine};
    pub use crate::systems::{
        GlimmerEventEnded, GlimmerEventRule, GlimmerLedger, GlimmerTier, RuleServices, RuleState,
        StationEvent, TileTarget,
    };
}
