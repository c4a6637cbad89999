//! Planar polygons and convex hulls.

use std::f32::consts::TAU;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use super::geometry::Pose;

/// Number of vertices used when a circle is approximated by a polygon.
pub const CIRCLE_VERTICES: usize = 20;

/// Ordered polygon vertices in world (or robot) coordinates, meters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle centered on the origin, `length` along x and `width` along y.
    pub fn rectangle(length: f32, width: f32) -> Self {
        let hl = 0.5 * length;
        let hw = 0.5 * width;
        Self::new(vec![
            Vec2::new(hl, hw),
            Vec2::new(-hl, hw),
            Vec2::new(-hl, -hw),
            Vec2::new(hl, -hw),
        ])
    }

    /// Regular polygon approximating the circle of `radius` around `center`.
    pub fn from_circle(center: Vec2, radius: f32) -> Self {
        let points = (0..CIRCLE_VERTICES)
            .map(|i| {
                let theta = i as f32 * TAU / CIRCLE_VERTICES as f32;
                center + radius * Vec2::new(theta.cos(), theta.sin())
            })
            .collect();
        Self::new(points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Absolute area from the shoelace formula over the vertex order.
    pub fn area(&self) -> f32 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f32 = (0..n)
            .map(|i| self.points[i].perp_dot(self.points[(i + 1) % n]))
            .sum();
        0.5 * twice.abs()
    }

    /// Even-odd point containment test.
    pub fn contains(&self, p: Vec2) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Polygon with every vertex mapped from the robot frame through `pose`.
    pub fn transform(&self, pose: &Pose) -> Self {
        Self::new(self.points.iter().map(|p| pose.transform_point(*p)).collect())
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(self.points.iter().map(|p| *p + delta).collect())
    }

    /// Convex hull of this polygon's vertices.
    pub fn convex_hull(&self) -> Self {
        Self::convex_hull_of_points(&self.points)
    }

    /// Convex hull of the vertices of both polygons.
    pub fn union_hull(a: &Self, b: &Self) -> Self {
        let mut points = Vec::with_capacity(a.len() + b.len());
        points.extend_from_slice(&a.points);
        points.extend_from_slice(&b.points);
        Self::convex_hull_of_points(&points)
    }

    /// Andrew's monotone chain. Output is counter-clockwise without collinear points;
    /// inputs with fewer than three distinct points are returned deduplicated.
    pub fn convex_hull_of_points(points: &[Vec2]) -> Self {
        let mut sorted: Vec<Vec2> = points.to_vec();
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        sorted.dedup();
        if sorted.len() < 3 {
            return Self::new(sorted);
        }

        let cross = |o: Vec2, a: Vec2, b: Vec2| (a - o).perp_dot(b - o);
        let mut hull: Vec<Vec2> = Vec::with_capacity(2 * sorted.len());

        for &p in &sorted {
            while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
                hull.pop();
            }
            hull.push(p);
        }
        let lower_len = hull.len() + 1;
        for &p in sorted.iter().rev().skip(1) {
            while hull.len() >= lower_len
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();
        Self::new(hull)
    }
}

/// Polygon tagged with the frame it is expressed in, a creation time and a display height.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedPolygon {
    pub polygon: Polygon,
    pub frame_id: String,
    /// Nanoseconds since the Unix epoch.
    pub stamp_ns: u64,
    pub z: f32,
}

impl StampedPolygon {
    pub fn now(polygon: Polygon, frame_id: impl Into<String>, z: f32) -> Self {
        let stamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            polygon,
            frame_id: frame_id.into(),
            stamp_ns,
            z,
        }
    }
}
