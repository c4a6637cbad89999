use glam::{IVec2, UVec2, Vec2};

use crate::grid::Grid;
use crate::types::Polygon;

/// Iterator over all grid cells whose center lies inside a polygon.
///
/// Rows are scanned through the cell centers and crossings are paired even-odd,
/// so non-convex outlines work as well. Points are in world coordinates (meters).
#[derive(Debug, Clone)]
pub struct PolygonIterator {
    /// Vertices in continuous map coordinates (cells).
    points: Vec<Vec2>,
    y: i32,
    y_max: i32,
    grid_size: IVec2,
    /// Inclusive x ranges still to visit on the current row, reversed.
    spans: Vec<(i32, i32)>,
    cell: IVec2,
    x_end: i32,
    has_span: bool,
}

impl PolygonIterator {
    /// Returns `None` for polygons with fewer than three vertices.
    pub fn new<G: Grid + ?Sized>(grid: &G, polygon: &Polygon) -> Option<Self> {
        Self::from_points(grid, &polygon.points)
    }

    pub fn from_points<G: Grid + ?Sized>(grid: &G, points: &[Vec2]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let info = grid.info();
        let map_points = points
            .iter()
            .map(|p| info.world_to_map_unchecked(*p))
            .collect();
        Some(Self::new_map(map_points, info.width, info.height))
    }

    fn new_map(points: Vec<Vec2>, width: u32, height: u32) -> Self {
        let (min_y, max_y) = points
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min_y, max_y), p| {
                (min_y.min(p.y), max_y.max(p.y))
            });
        let grid_size = IVec2::new(width as i32, height as i32);
        let y_min = (min_y.floor() as i32).max(0);
        let y_max = (max_y.ceil() as i32).min(grid_size.y - 1);

        Self {
            points,
            y: y_min - 1,
            y_max,
            grid_size,
            spans: Vec::new(),
            cell: IVec2::ZERO,
            x_end: -1,
            has_span: false,
        }
    }

    /// Compute the spans of the row `self.y`, clipped to the grid.
    fn scan_row(&mut self) {
        let y_scan = self.y as f32 + 0.5;
        let n = self.points.len();
        let mut xs = Vec::with_capacity(n);

        for i in 0..n {
            let p0 = self.points[i];
            let p1 = self.points[(i + 1) % n];
            // Half-open rule so a vertex on the scanline is counted once.
            if (p0.y <= y_scan) != (p1.y <= y_scan) {
                let t = (y_scan - p0.y) / (p1.y - p0.y);
                xs.push(p0.x + t * (p1.x - p0.x));
            }
        }
        xs.sort_by(f32::total_cmp);

        self.spans.clear();
        for pair in xs.chunks_exact(2).rev() {
            let x_start = ((pair[0] - 0.5).ceil() as i32).max(0);
            let x_end = ((pair[1] - 0.5).floor() as i32).min(self.grid_size.x - 1);
            if x_start <= x_end {
                self.spans.push((x_start, x_end));
            }
        }
    }

    fn advance_span(&mut self) -> bool {
        loop {
            if let Some((x_start, x_end)) = self.spans.pop() {
                self.cell = IVec2::new(x_start, self.y);
                self.x_end = x_end;
                self.has_span = true;
                return true;
            }
            self.y += 1;
            if self.y > self.y_max {
                return false;
            }
            self.scan_row();
        }
    }
}

impl Iterator for PolygonIterator {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.has_span && self.cell.x <= self.x_end {
                let cell = self.cell.as_uvec2();
                self.cell.x += 1;
                return Some(cell);
            }

            self.has_span = false;
            if !self.advance_span() {
                return None;
            }
        }
    }
}
