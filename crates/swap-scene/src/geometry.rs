//! Node geometry
//!
//! A node carries exactly one of two geometry records: an anchored
//! rectangle (layout-driven UI nodes) or a world-space transform.

use serde::{Deserialize, Serialize};

/// 2D vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 3D vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Unit scale
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    /// No rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Layout rectangle anchored inside its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectGeometry {
    /// Offset of the pivot from the anchor reference point
    pub anchored_position: Vec2,
    /// Size relative to the distance between anchors
    pub size_delta: Vec2,
    pub scale: Vec3,
    pub anchor_min: Vec2,
    pub anchor_max: Vec2,
    pub pivot: Vec2,
}

impl Default for RectGeometry {
    fn default() -> Self {
        Self {
            anchored_position: Vec2::ZERO,
            size_delta: Vec2::new(100.0, 100.0),
            scale: Vec3::ONE,
            anchor_min: Vec2::new(0.5, 0.5),
            anchor_max: Vec2::new(0.5, 0.5),
            pivot: Vec2::new(0.5, 0.5),
        }
    }
}

/// World-space transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGeometry {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for WorldGeometry {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Geometry record of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    /// Anchored rectangle
    Rect(RectGeometry),
    /// World-space transform
    World(WorldGeometry),
}

impl Default for Geometry {
    fn default() -> Self {
        Self::World(WorldGeometry::default())
    }
}

impl Geometry {
    /// Check if this is an anchored rectangle
    #[inline]
    #[must_use]
    pub fn is_rect(&self) -> bool {
        matches!(self, Self::Rect(_))
    }

    /// World position; a rect reports its anchored position on the z = 0 plane
    #[must_use]
    pub fn world_position(&self) -> Vec3 {
        match self {
            Self::Rect(rect) => Vec3::new(rect.anchored_position.x, rect.anchored_position.y, 0.0),
            Self::World(world) => world.position,
        }
    }

    /// World rotation; rects are never rotated
    #[must_use]
    pub fn world_rotation(&self) -> Quat {
        match self {
            Self::Rect(_) => Quat::IDENTITY,
            Self::World(world) => world.rotation,
        }
    }

    #[must_use]
    pub fn scale(&self) -> Vec3 {
        match self {
            Self::Rect(rect) => rect.scale,
            Self::World(world) => world.scale,
        }
    }

    /// Write world position, rotation and scale
    ///
    /// On a rect only x/y of the position and the scale apply.
    pub fn set_world(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        match self {
            Self::Rect(rect) => {
                rect.anchored_position = Vec2::new(position.x, position.y);
                rect.scale = scale;
            }
            Self::World(world) => {
                world.position = position;
                world.rotation = rotation;
                world.scale = scale;
            }
        }
    }
}
