use glam::{UVec2, Vec2};

use crate::grid::Grid;

/// Row-major iterator over a rectangular window of cells.
#[derive(Debug, Clone)]
pub struct SubmapIterator {
    min: UVec2,
    /// Inclusive.
    max: UVec2,
    cell: UVec2,
    empty: bool,
    done: bool,
}

impl SubmapIterator {
    /// Cells covering the `length` rectangle centered at `center`, clipped to the map.
    /// Returns `None` if `center` lies outside the map.
    pub fn new<G: Grid + ?Sized>(grid: &G, center: Vec2, length: Vec2) -> Option<Self> {
        let info = grid.info();
        info.world_to_cell(center)?;
        let half = 0.5 * length.abs();
        Some(Self::from_corners(grid, center - half, center + half))
    }

    /// Cells covering the world-space box `[min, max]`, clipped to the map.
    /// The window is empty if the box misses the map entirely.
    pub fn from_corners<G: Grid + ?Sized>(grid: &G, min: Vec2, max: Vec2) -> Self {
        let info = grid.info();
        let lo = info.world_to_map_unchecked(min).floor();
        let hi = info.world_to_map_unchecked(max).floor();
        let limit = Vec2::new(info.width as f32 - 1.0, info.height as f32 - 1.0);
        let empty = info.width == 0
            || info.height == 0
            || !lo.is_finite()
            || !hi.is_finite()
            || hi.x < 0.0
            || hi.y < 0.0
            || lo.x > limit.x
            || lo.y > limit.y;
        let lo = lo.clamp(Vec2::ZERO, limit.max(Vec2::ZERO)).as_uvec2();
        let hi = hi.clamp(Vec2::ZERO, limit.max(Vec2::ZERO)).as_uvec2();
        Self::from_cells(lo, hi, empty)
    }

    fn from_cells(min: UVec2, max: UVec2, empty: bool) -> Self {
        let empty = empty || min.x > max.x || min.y > max.y;
        Self {
            min,
            max,
            cell: min,
            empty,
            done: empty,
        }
    }

    /// First (lowest) cell of the window.
    pub fn min_cell(&self) -> UVec2 {
        self.min
    }

    /// Number of cells along each axis (zero if empty).
    pub fn size(&self) -> UVec2 {
        if self.empty {
            return UVec2::ZERO;
        }
        self.max - self.min + UVec2::ONE
    }
}

impl Iterator for SubmapIterator {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cell = self.cell;
        if self.cell.x < self.max.x {
            self.cell.x += 1;
        } else if self.cell.y < self.max.y {
            self.cell.x = self.min.x;
            self.cell.y += 1;
        } else {
            self.done = true;
        }
        Some(cell)
    }
}
