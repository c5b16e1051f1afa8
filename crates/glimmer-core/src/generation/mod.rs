//! Generation - procedural creation of stations and their grids

mod station;

pub use station::*;
