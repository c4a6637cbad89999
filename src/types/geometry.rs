//! Poses and robot footprints.

use glam::{Quat, Vec2, Vec3};

use super::polygon::Polygon;

/// Robot pose in world coordinates (meters).
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Pose on the ground plane rotated by `yaw` around +z.
    pub fn planar(x: f32, y: f32, yaw: f32) -> Self {
        Self::new(Vec3::new(x, y, 0.0), Quat::from_rotation_z(yaw))
    }

    /// Position projected onto the map plane.
    #[inline]
    pub fn xy(&self) -> Vec2 {
        self.position.truncate()
    }

    /// Rigidly transform a point given in the robot frame into the map plane.
    #[inline]
    pub fn transform_point(&self, point: Vec2) -> Vec2 {
        (self.position + self.orientation * point.extend(0.0)).truncate()
    }
}

/// Robot extent used by a traversability query.
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Circle { radius: f32 },
    /// Vertices in the robot's local frame.
    Polygon(Polygon),
}

impl Footprint {
    /// Polygonal footprint from robot-frame vertices; an empty vertex list selects
    /// the circular footprint with `radius`.
    pub fn from_points(points: Vec<Vec2>, radius: f32) -> Self {
        if points.is_empty() {
            Self::Circle { radius }
        } else {
            Self::Polygon(Polygon::new(points))
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self, Self::Circle { .. })
    }
}
