//! Station generation - elliptical grids with walls and hull breaches

use hecs::Entity;
use rand::Rng;

use crate::components::{MapGrid, TileKind, Vec2, Vec2i};
use crate::systems::StationMap;

/// Configuration for station generation
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub name: String,
    pub grid_count: u32,
    /// Grid width in tiles
    pub grid_width: i32,
    /// Grid height in tiles
    pub grid_height: i32,
    /// Chance an interior tile is a wall
    pub interior_wall_chance: f64,
    /// Chance an interior tile is missing (open to space)
    pub breach_chance: f64,
    /// Gap between grids in world units
    pub grid_spacing: f32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: "Station".to_string(),
            grid_count: 3,
            grid_width: 24,
            grid_height: 16,
            interior_wall_chance: 0.15,
            breach_chance: 0.02,
            grid_spacing: 8.0,
        }
    }
}

/// Entities created for one station
#[derive(Debug, Clone)]
pub struct StationLayout {
    pub name: String,
    pub station: Entity,
    pub grids: Vec<Entity>,
}

/// Check if a tile centre is inside the grid's elliptical hull
fn tile_in_hull(x: i32, y: i32, width: i32, height: i32) -> bool {
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;
    let dx = (x as f32 + 0.5 - half_w) / half_w;
    let dy = (y as f32 + 0.5 - half_h) / half_h;
    dx * dx + dy * dy <= 1.0
}

/// A hull tile with any neighbour outside the hull is an outer wall
fn is_rim(x: i32, y: i32, width: i32, height: i32) -> bool {
    [(1, 0), (-1, 0), (0, 1), (0, -1)]
        .iter()
        .any(|(dx, dy)| !tile_in_hull(x + dx, y + dy, width, height))
}

/// Build one grid's tiles
pub fn generate_grid(config: &StationConfig, world_position: Vec2, rng: &mut impl Rng) -> MapGrid {
    let mut grid = MapGrid::new(world_position);
    let (width, height) = (config.grid_width.max(1), config.grid_height.max(1));

    for x in 0..width {
        for y in 0..height {
            if !tile_in_hull(x, y, width, height) {
                continue;
            }
            let tile = Vec2i::new(x, y);
            if is_rim(x, y, width, height) {
                grid.set_tile(tile, TileKind::Wall);
            } else if rng.gen_bool(config.breach_chance.clamp(0.0, 1.0)) {
                // left empty: hull breach
            } else if rng.gen_bool(config.interior_wall_chance.clamp(0.0, 1.0)) {
                grid.set_tile(tile, TileKind::Wall);
            } else {
                grid.set_tile(tile, TileKind::Floor);
            }
        }
    }
    grid
}

/// Generate a station with its grids in the map
pub fn generate_station(map: &mut StationMap, config: &StationConfig, rng: &mut impl Rng) -> StationLayout {
    let station = map.spawn_station(&config.name);
    let mut grids = Vec::new();

    let stride = config.grid_width.max(1) as f32 + config.grid_spacing;
    for index in 0..config.grid_count {
        let position = Vec2::new(index as f32 * stride, 0.0);
        let grid = generate_grid(config, position, rng);
        if let Some(entity) = map.spawn_grid(station, grid) {
            grids.push(entity);
        }
    }

    log::info!(
        target: "stationevents",
        "generated station {} with {} grids",
        config.name,
        grids.len()
    );

    StationLayout {
        name: config.name.clone(),
        station,
        grids,
    }
}
