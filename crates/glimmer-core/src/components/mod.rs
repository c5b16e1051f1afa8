//! Component definitions for the station world.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod common;
mod station;

pub use common::*;
pub use station::*;
