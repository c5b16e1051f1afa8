//! Save/Load functionality for persisting engine state
//!
//! Uses bincode for the binary snapshot. Stations are flattened to plain
//! data (entities are not serializable) and rebuilt on load. The event
//! catalog uses an internally tagged enum, which bincode cannot decode, so it
//! is embedded as a JSON string. Rules in flight are not saved.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::components::MapGrid;
use crate::config::{ConfigError, EventCatalog};
use crate::systems::{GlimmerLedger, GlimmerPool, StationMap, StationRegistry};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the engine state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub sim_time: f64,
    pub time_scale: f32,
    pub glimmer: GlimmerPool,
    /// Event catalog as JSON
    pub catalog: String,
    pub stations: Vec<SerializableStation>,
}

/// A station with its grids, in registry order
#[derive(Serialize, Deserialize, Clone)]
pub struct SerializableStation {
    pub name: String,
    /// `None` for grids without spatial data
    pub grids: Vec<Option<MapGrid>>,
}

fn serialize_stations(map: &StationMap) -> Vec<SerializableStation> {
    map.stations()
        .into_iter()
        .map(|station| SerializableStation {
            name: map.station_name(station).unwrap_or_default(),
            grids: map
                .station_grids(station)
                .into_iter()
                .map(|grid| map.world.get::<&MapGrid>(grid).ok().map(|g| (*g).clone()))
                .collect(),
        })
        .collect()
}

fn deserialize_stations(stations: Vec<SerializableStation>) -> StationMap {
    let mut map = StationMap::new();
    for saved in stations {
        let station = map.spawn_station(saved.name);
        for grid in saved.grids {
            match grid {
                Some(grid) => map.spawn_grid(station, grid),
                None => map.spawn_bare_grid(station),
            };
        }
    }
    map
}

/// Save engine state to a writer
pub fn save_engine<W: Write>(
    writer: W,
    sim_time: f64,
    time_scale: f32,
    glimmer: &GlimmerPool,
    catalog: &EventCatalog,
    stations: &StationMap,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        sim_time,
        time_scale,
        glimmer: glimmer.clone(),
        catalog: serde_json::to_string(catalog)?,
        stations: serialize_stations(stations),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load engine state from a reader
pub fn load_engine<R: Read>(reader: R) -> Result<LoadedEngine, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(LoadedEngine {
        sim_time: save_data.sim_time,
        time_scale: save_data.time_scale,
        glimmer: GlimmerPool::new(save_data.glimmer.glimmer()),
        catalog: EventCatalog::from_json_str(&save_data.catalog)?,
        stations: deserialize_stations(save_data.stations),
    })
}

/// Result of loading a save
pub struct LoadedEngine {
    pub sim_time: f64,
    pub time_scale: f32,
    pub glimmer: GlimmerPool,
    pub catalog: EventCatalog,
    pub stations: StationMap,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Catalog encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog rejected: {0}")]
    Catalog(#[from] ConfigError),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
