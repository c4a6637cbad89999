//! Map metadata.

use glam::{UVec2, Vec2};

/// Geometry shared by every layer of a grid.
///
/// Cell `(x, y)` covers `[origin + (x, y) * resolution, origin + (x + 1, y + 1) * resolution)`.
/// Positions of cells always refer to the cell center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapInfo {
    pub width: u32,
    pub height: u32,
    pub resolution: f32,
    /// Corner of cell (0, 0) in world coordinates (meters).
    pub origin: Vec2,
}

impl Default for MapInfo {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            resolution: 0.05,
            origin: Vec2::ZERO,
        }
    }
}

impl MapInfo {
    pub fn square(width: u32, resolution: f32) -> Self {
        Self {
            width,
            height: width,
            resolution,
            ..Default::default()
        }
    }

    /// Map of `width x height` cells whose geometric center sits at `center`.
    pub fn centered(width: u32, height: u32, resolution: f32, center: Vec2) -> Self {
        let half = Vec2::new(width as f32, height as f32) * resolution * 0.5;
        Self {
            width,
            height,
            resolution,
            origin: center - half,
        }
    }

    /// Width of the map in world units (meters).
    #[inline]
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.resolution
    }

    /// Height of the map in world units (meters).
    #[inline]
    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.resolution
    }

    /// Side lengths of the map in meters.
    #[inline]
    pub fn length(&self) -> Vec2 {
        Vec2::new(self.world_width(), self.world_height())
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn contains_cell(&self, cell: UVec2) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Row-major offset of `cell` into layer storage.
    #[inline]
    pub fn linear_index(&self, cell: UVec2) -> usize {
        (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    /// World position of the center of `cell`.
    #[inline]
    pub fn cell_center(&self, cell: UVec2) -> Vec2 {
        self.origin + (cell.as_vec2() + Vec2::splat(0.5)) * self.resolution
    }

    /// Continuous map coordinates (in cells) of a world position, without bounds checks.
    #[inline]
    pub fn world_to_map_unchecked(&self, pos: Vec2) -> Vec2 {
        (pos - self.origin) / self.resolution
    }

    /// Cell containing `pos`, or `None` when `pos` lies outside the map or is not finite.
    pub fn world_to_cell(&self, pos: Vec2) -> Option<UVec2> {
        let map = self.world_to_map_unchecked(pos);
        let inside = map.x >= 0.0
            && map.y >= 0.0
            && map.x < self.width as f32
            && map.y < self.height as f32;
        if !inside {
            return None;
        }
        // Guards against rounding right at the upper edge.
        let cell = map.floor().as_uvec2();
        Some(cell.min(UVec2::new(self.width - 1, self.height - 1)))
    }

    #[inline]
    pub fn is_inside(&self, pos: Vec2) -> bool {
        self.world_to_cell(pos).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_map_puts_cell_centers_symmetric() {
        let info = MapInfo::centered(11, 11, 0.1, Vec2::ZERO);
        let center = info.cell_center(UVec2::new(5, 5));
        assert!(center.length() < 1e-6);
        assert_eq!(info.world_to_cell(Vec2::ZERO), Some(UVec2::new(5, 5)));
    }

    #[test]
    fn world_to_cell_rejects_outside_positions() {
        let info = MapInfo::square(10, 1.0);
        assert_eq!(info.world_to_cell(Vec2::new(-0.01, 2.0)), None);
        assert_eq!(info.world_to_cell(Vec2::new(10.0, 2.0)), None);
        assert_eq!(info.world_to_cell(Vec2::new(9.99, 0.0)), Some(UVec2::new(9, 0)));
    }

    #[test]
    fn world_to_cell_rejects_non_finite_positions() {
        let info = MapInfo::centered(10, 10, 0.1, Vec2::ZERO);
        assert_eq!(info.world_to_cell(Vec2::NAN), None);
        assert_eq!(info.world_to_cell(Vec2::new(f32::NAN, 0.0)), None);
        assert_eq!(info.world_to_cell(Vec2::new(0.0, f32::INFINITY)), None);
        assert!(!info.is_inside(Vec2::new(0.0, f32::NAN)));
    }

    #[test]
    fn cell_center_round_trips_through_world_to_cell() {
        let info = MapInfo {
            width: 7,
            height: 4,
            resolution: 0.05,
            origin: Vec2::new(-0.18, 0.3),
        };
        for y in 0..info.height {
            for x in 0..info.width {
                let cell = UVec2::new(x, y);
                assert_eq!(info.world_to_cell(info.cell_center(cell)), Some(cell));
            }
        }
    }
}
