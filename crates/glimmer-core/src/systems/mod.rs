//! Systems - logic that drives station events and the glimmer pool

mod audit;
mod ledger;
mod rule;
mod station_map;
mod ticker;
mod tile_search;

pub use audit::*;
pub use ledger::*;
pub use rule::*;
pub use station_map::*;
pub use ticker::*;
pub use tile_search::*;
