//! Common spatial types shared by stations, grids and searches.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// 2D world-space vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Integer tile index within a grid
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned world-space box
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Box2 {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Box2 {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Shift the box by `offset`
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            left: self.left + offset.x,
            bottom: self.bottom + offset.y,
            right: self.right + offset.x,
            top: self.top + offset.y,
        }
    }

    /// Edges inclusive on every side.
    pub fn contains(&self, point: &Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.bottom && point.y <= self.top
    }
}

/// A position expressed in a grid's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoordinates {
    pub grid: Entity,
    pub position: Vec2,
}

impl GridCoordinates {
    pub fn new(grid: Entity, position: Vec2) -> Self {
        Self { grid, position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_operations() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(4.0, 6.0);

        let sum = a + b;
        assert_eq!(sum.x, 5.0);
        assert_eq!(sum.y, 8.0);

        let diff = b - a;
        assert_eq!(diff.x, 3.0);
        assert_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_box_translate_and_contains() {
        let bb = Box2::new(0.0, 0.0, 10.0, 4.0).translated(Vec2::new(-5.0, 2.0));
        assert_eq!(bb.left, -5.0);
        assert_eq!(bb.top, 6.0);
        assert_eq!(bb.width(), 10.0);
        assert_eq!(bb.height(), 4.0);
        assert!(bb.contains(&Vec2::new(0.0, 3.0)));
        assert!(!bb.contains(&Vec2::new(6.0, 3.0)));
    }
}
