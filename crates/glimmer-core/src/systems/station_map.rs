//! Station map - the hecs world holding stations and their grids

use hecs::{Entity, World};

use super::tile_search::{GridPlacement, StationRegistry, TileQuery};
use crate::components::{MapGrid, StationData, Vec2i};

/// Stations and grids, with a stable station ordering
#[derive(Default)]
pub struct StationMap {
    /// ECS world containing station and grid entities
    pub world: World,
    stations: Vec<Entity>,
}

impl StationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_station(&mut self, name: impl Into<String>) -> Entity {
        let station = self.world.spawn((StationData::new(name),));
        self.stations.push(station);
        station
    }

    /// Attach a grid with tiles to a station. `None` if the station is unknown.
    pub fn spawn_grid(&mut self, station: Entity, grid: MapGrid) -> Option<Entity> {
        if !self.stations.contains(&station) {
            return None;
        }
        let entity = self.world.spawn((grid,));
        self.link_grid(station, entity);
        Some(entity)
    }

    /// Attach a grid entity that has no spatial data yet
    pub fn spawn_bare_grid(&mut self, station: Entity) -> Option<Entity> {
        if !self.stations.contains(&station) {
            return None;
        }
        let entity = self.world.spawn(());
        self.link_grid(station, entity);
        Some(entity)
    }

    fn link_grid(&mut self, station: Entity, grid: Entity) {
        if let Ok(mut data) = self.world.get::<&mut StationData>(station) {
            data.grids.push(grid);
        }
    }

    /// Despawn a station and all of its grids
    pub fn remove_station(&mut self, station: Entity) -> bool {
        let Some(index) = self.stations.iter().position(|s| *s == station) else {
            return false;
        };
        self.stations.remove(index);

        let grids = self.station_grids(station);
        for grid in grids {
            let _ = self.world.despawn(grid);
        }
        self.world.despawn(station).is_ok()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn grid_count(&self) -> usize {
        self.stations
            .iter()
            .map(|s| self.station_grids(*s).len())
            .sum()
    }

    pub fn station_name(&self, station: Entity) -> Option<String> {
        self.world
            .get::<&StationData>(station)
            .ok()
            .map(|s| s.name.clone())
    }
}

impl StationRegistry for StationMap {
    fn stations(&self) -> Vec<Entity> {
        self.stations.clone()
    }

    fn station_grids(&self, station: Entity) -> Vec<Entity> {
        self.world
            .get::<&StationData>(station)
            .map(|s| s.grids.clone())
            .unwrap_or_default()
    }

    fn grid_placement(&self, grid: Entity) -> Option<GridPlacement> {
        let map_grid = self.world.get::<&MapGrid>(grid).ok()?;
        Some(GridPlacement {
            world_aabb: map_grid.world_aabb(),
            world_position: map_grid.world_position,
        })
    }
}

impl TileQuery for StationMap {
    fn is_tile_space(&self, grid: Entity, _placement: &GridPlacement, tile: Vec2i) -> bool {
        match self.world.get::<&MapGrid>(grid) {
            Ok(map_grid) => map_grid.tile(tile).is_none(),
            Err(_) => true,
        }
    }

    fn is_tile_air_blocked(&self, grid: Entity, _placement: &GridPlacement, tile: Vec2i) -> bool {
        match self.world.get::<&MapGrid>(grid) {
            Ok(map_grid) => map_grid.tile(tile).is_some_and(|t| t.is_air_blocked()),
            Err(_) => false,
        }
    }
}
