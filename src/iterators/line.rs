use glam::{IVec2, UVec2, Vec2};

use crate::grid::Grid;

/// Iterator over the cells on the straight line between two cells (Bresenham).
///
/// Both end cells are yielded; the start cell comes first.
#[derive(Debug, Clone)]
pub struct LineIterator {
    cell: IVec2,
    end: IVec2,
    /// Normalised step direction along each axis.
    step: IVec2,
    /// `(|dx|, -|dy|)` of the whole line.
    delta: IVec2,
    error: i32,
    done: bool,
}

impl LineIterator {
    /// Line between two cells. Returns `None` if either cell lies outside the grid.
    pub fn new<G: Grid + ?Sized>(grid: &G, start: UVec2, end: UVec2) -> Option<Self> {
        let info = grid.info();
        if !info.contains_cell(start) || !info.contains_cell(end) {
            return None;
        }
        Some(Self::from_cells(start.as_ivec2(), end.as_ivec2()))
    }

    /// Line between two world positions, clipped to the grid.
    /// Returns `None` if the segment does not touch the grid.
    pub fn between_positions<G: Grid + ?Sized>(grid: &G, start: Vec2, end: Vec2) -> Option<Self> {
        let (start, end) = clip_to_grid(grid, start, end)?;
        let info = grid.info();
        let start = info.world_to_cell(start)?;
        let end = info.world_to_cell(end)?;
        Some(Self::from_cells(start.as_ivec2(), end.as_ivec2()))
    }

    fn from_cells(start: IVec2, end: IVec2) -> Self {
        let d = end - start;
        let delta = IVec2::new(d.x.abs(), -d.y.abs());
        Self {
            cell: start,
            end,
            step: d.signum(),
            delta,
            error: delta.x + delta.y,
            done: false,
        }
    }
}

impl Iterator for LineIterator {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let current = self.cell;
        if current == self.end {
            self.done = true;
            return Some(current.as_uvec2());
        }

        let e2 = 2 * self.error;
        if e2 >= self.delta.y {
            self.error += self.delta.y;
            self.cell.x += self.step.x;
        }
        if e2 <= self.delta.x {
            self.error += self.delta.x;
            self.cell.y += self.step.y;
        }
        Some(current.as_uvec2())
    }
}

/// Liang-Barsky clipping of the segment against the (slightly shrunk) map box.
fn clip_to_grid<G: Grid + ?Sized>(grid: &G, start: Vec2, end: Vec2) -> Option<(Vec2, Vec2)> {
    let info = grid.info();
    if info.width == 0 || info.height == 0 || !start.is_finite() || !end.is_finite() {
        return None;
    }
    let margin = 1e-4 * info.resolution;
    let lo = info.origin + Vec2::splat(margin);
    let hi = info.origin + info.length() - Vec2::splat(margin);

    let d = end - start;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for (p, q) in [
        (-d.x, start.x - lo.x),
        (d.x, hi.x - start.x),
        (-d.y, start.y - lo.y),
        (d.y, hi.y - start.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((start + t0 * d, start + t1 * d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid2d;
    use crate::types::MapInfo;

    fn test_grid() -> Grid2d<u8> {
        Grid2d::filled(MapInfo::square(10, 1.0), 0)
    }

    #[test]
    fn includes_both_end_cells() {
        let grid = test_grid();
        let cells: Vec<UVec2> = LineIterator::new(&grid, UVec2::new(1, 1), UVec2::new(8, 4))
            .unwrap()
            .collect();
        assert_eq!(cells.first().copied(), Some(UVec2::new(1, 1)));
        assert_eq!(cells.last().copied(), Some(UVec2::new(8, 4)));
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn single_cell_line() {
        let grid = test_grid();
        let cells: Vec<UVec2> = LineIterator::new(&grid, UVec2::new(3, 3), UVec2::new(3, 3))
            .unwrap()
            .collect();
        assert_eq!(cells, vec![UVec2::new(3, 3)]);
    }

    #[test]
    fn reversed_line_visits_same_cells_on_axis() {
        let grid = test_grid();
        let forward: Vec<UVec2> = LineIterator::new(&grid, UVec2::new(7, 2), UVec2::new(2, 2))
            .unwrap()
            .collect();
        assert_eq!(forward.len(), 6);
        assert!(forward.windows(2).all(|w| w[0].x == w[1].x + 1));
    }

    #[test]
    fn outside_cells_are_rejected() {
        let grid = test_grid();
        assert!(LineIterator::new(&grid, UVec2::new(0, 0), UVec2::new(10, 0)).is_none());
    }

    #[test]
    fn positions_are_clipped_to_the_map() {
        let grid = test_grid();
        let cells: Vec<UVec2> =
            LineIterator::between_positions(&grid, Vec2::new(-5.0, 5.5), Vec2::new(15.0, 5.5))
                .unwrap()
                .collect();
        assert_eq!(cells.first().copied(), Some(UVec2::new(0, 5)));
        assert_eq!(cells.last().copied(), Some(UVec2::new(9, 5)));
        assert_eq!(cells.len(), 10);
    }

    #[test]
    fn non_finite_positions_yield_nothing() {
        let grid = test_grid();
        assert!(LineIterator::between_positions(&grid, Vec2::NAN, Vec2::new(5.0, 5.0)).is_none());
        assert!(
            LineIterator::between_positions(&grid, Vec2::new(5.0, 5.0), Vec2::new(f32::NAN, 1.0))
                .is_none()
        );
    }

    #[test]
    fn segment_missing_the_map_yields_nothing() {
        let grid = test_grid();
        assert!(
            LineIterator::between_positions(&grid, Vec2::new(-5.0, -1.0), Vec2::new(15.0, -1.0))
                .is_none()
        );
    }
}
