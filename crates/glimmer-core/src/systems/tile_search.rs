//! Randomized tile search - best-effort sampling for a usable target tile
//!
//! Picks a random station, a random grid on it, then samples up to
//! [`TILE_SEARCH_ATTEMPTS`] tiles inside the grid's world bounds. A tile is
//! usable when it is neither open space nor air-blocked. Running out of
//! attempts is a normal outcome; callers skip their spatial effect.

use hecs::Entity;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{tile_to_local, Box2, GridCoordinates, Vec2, Vec2i};

/// Sampling budget per search
pub const TILE_SEARCH_ATTEMPTS: usize = 10;

/// Spatial data of a grid needed to sample it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlacement {
    pub world_aabb: Box2,
    pub world_position: Vec2,
}

/// Lookup of stations and their grids
pub trait StationRegistry {
    fn stations(&self) -> Vec<Entity>;

    fn station_grids(&self, station: Entity) -> Vec<Entity>;

    /// `None` when the grid has no spatial representation
    fn grid_placement(&self, grid: Entity) -> Option<GridPlacement>;
}

/// Atmospheric tile predicates provided by the world simulation
pub trait TileQuery {
    fn is_tile_space(&self, grid: Entity, placement: &GridPlacement, tile: Vec2i) -> bool;

    fn is_tile_air_blocked(&self, grid: Entity, placement: &GridPlacement, tile: Vec2i) -> bool;
}

/// A usable tile found by [`try_find_random_tile`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTarget {
    /// Grid-local tile index
    pub tile: Vec2i,
    pub station: Entity,
    pub grid: Entity,
    /// Centre of the tile in the grid's frame
    pub coordinates: GridCoordinates,
}

/// Uniform integer in `[lower, upper)`, or `lower` when the range is empty
fn next_in(rng: &mut impl Rng, lower: i32, upper: i32) -> i32 {
    if upper <= lower {
        lower
    } else {
        rng.gen_range(lower..upper)
    }
}

/// Find a random tile that is neither space nor air-blocked
pub fn try_find_random_tile(
    registry: &impl StationRegistry,
    tiles: &impl TileQuery,
    rng: &mut impl Rng,
) -> Option<TileTarget> {
    let stations = registry.stations();
    let station = *stations.choose(rng)?;

    let grids = registry.station_grids(station);
    let grid = *grids.choose(rng)?;

    let Some(placement) = registry.grid_placement(grid) else {
        log::debug!(target: "stationevents", "grid {:?} has no spatial data", grid);
        return None;
    };

    let bounds = placement.world_aabb;
    let origin = Vec2i::new(
        placement.world_position.x as i32,
        placement.world_position.y as i32,
    );

    for _ in 0..TILE_SEARCH_ATTEMPTS {
        let x = next_in(rng, bounds.left as i32, bounds.right as i32);
        let y = next_in(rng, bounds.bottom as i32, bounds.top as i32);
        // saturated casts can put the origin out of reach
        let (Some(tile_x), Some(tile_y)) = (x.checked_sub(origin.x), y.checked_sub(origin.y)) else {
            continue;
        };
        let tile = Vec2i::new(tile_x, tile_y);

        if tiles.is_tile_space(grid, &placement, tile)
            || tiles.is_tile_air_blocked(grid, &placement, tile)
        {
            continue;
        }

        return Some(TileTarget {
            tile,
            station,
            grid,
            coordinates: GridCoordinates::new(grid, tile_to_local(tile)),
        });
    }

    log::debug!(
        target: "stationevents",
        "no usable tile on grid {:?} after {} attempts",
        grid,
        TILE_SEARCH_ATTEMPTS
    );
    None
}
