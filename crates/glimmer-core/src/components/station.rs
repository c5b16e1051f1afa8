//! Station structure components: StationData, MapGrid, tiles.

use super::common::{Box2, Vec2, Vec2i};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Edge length of one tile in world units
pub const TILE_SIZE: f32 = 1.0;

/// Station component - a named collection of grids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationData {
    pub name: String,
    /// Grid entities owned by this station.
    /// Entities are not serializable; persistence rebuilds this list.
    #[serde(skip)]
    pub grids: Vec<Entity>,
}

impl StationData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grids: Vec::new(),
        }
    }
}

/// What occupies a tile. A missing tile is open space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Walkable plating
    Floor,
    /// Airtight structure blocking gas flow
    Wall,
}

impl TileKind {
    pub fn is_air_blocked(&self) -> bool {
        matches!(self, TileKind::Wall)
    }
}

/// Grid component - the spatial representation of a station section.
/// Grid entities without this component have no spatial data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapGrid {
    /// World position of the grid origin (tile 0,0 corner)
    pub world_position: Vec2,
    tiles: HashMap<Vec2i, TileKind>,
    local_bounds: Option<Box2>,
}

impl MapGrid {
    pub fn new(world_position: Vec2) -> Self {
        Self {
            world_position,
            tiles: HashMap::new(),
            local_bounds: None,
        }
    }

    /// Place or replace a tile. Bounds only ever grow.
    pub fn set_tile(&mut self, tile: Vec2i, kind: TileKind) {
        self.tiles.insert(tile, kind);
        let cell = Box2::new(
            tile.x as f32 * TILE_SIZE,
            tile.y as f32 * TILE_SIZE,
            (tile.x + 1) as f32 * TILE_SIZE,
            (tile.y + 1) as f32 * TILE_SIZE,
        );
        self.local_bounds = Some(match self.local_bounds {
            Some(b) => Box2::new(
                b.left.min(cell.left),
                b.bottom.min(cell.bottom),
                b.right.max(cell.right),
                b.top.max(cell.top),
            ),
            None => cell,
        });
    }

    /// Remove a tile, exposing it to space
    pub fn remove_tile(&mut self, tile: Vec2i) -> Option<TileKind> {
        self.tiles.remove(&tile)
    }

    pub fn tile(&self, tile: Vec2i) -> Option<TileKind> {
        self.tiles.get(&tile).copied()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tiles(&self) -> impl Iterator<Item = (&Vec2i, &TileKind)> {
        self.tiles.iter()
    }

    /// World-space bounding box of all tiles ever placed
    pub fn world_aabb(&self) -> Box2 {
        self.local_bounds
            .unwrap_or_default()
            .translated(self.world_position)
    }
}

/// Centre of a tile in grid-local coordinates
pub fn tile_to_local(tile: Vec2i) -> Vec2 {
    Vec2::new(
        (tile.x as f32 + 0.5) * TILE_SIZE,
        (tile.y as f32 + 0.5) * TILE_SIZE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_bounds_follow_tiles() {
        let mut grid = MapGrid::new(Vec2::new(10.0, -3.0));
        grid.set_tile(Vec2i::new(0, 0), TileKind::Floor);
        grid.set_tile(Vec2i::new(4, 2), TileKind::Wall);

        let aabb = grid.world_aabb();
        assert_eq!(aabb, Box2::new(10.0, -3.0, 15.0, 0.0));
        assert_eq!(grid.tile_count(), 2);
    }

    #[test]
    fn test_empty_grid_has_degenerate_bounds() {
        let grid = MapGrid::new(Vec2::new(2.0, 2.0));
        let aabb = grid.world_aabb();
        assert_eq!(aabb.width(), 0.0);
        assert_eq!(aabb.left, 2.0);
    }

    #[test]
    fn test_tile_kinds() {
        let mut grid = MapGrid::new(Vec2::ZERO);
        grid.set_tile(Vec2i::new(1, 1), TileKind::Wall);
        assert!(grid.tile(Vec2i::new(1, 1)).is_some_and(|t| t.is_air_blocked()));
        assert_eq!(grid.remove_tile(Vec2i::new(1, 1)), Some(TileKind::Wall));
        assert!(grid.tile(Vec2i::new(1, 1)).is_none());
        assert_eq!(tile_to_local(Vec2i::new(2, 3)), Vec2::new(2.5, 3.5));
    }
}
