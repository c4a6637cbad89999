use glam::{UVec2, Vec2};

use crate::grid::Grid;
use crate::iterators::SubmapIterator;
use crate::types::MapInfo;

/// Iterator over the cells whose center lies within `radius` of `center`.
#[derive(Debug, Clone)]
pub struct CircleIterator {
    window: SubmapIterator,
    info: MapInfo,
    center: Vec2,
    radius_sq: f32,
}

impl CircleIterator {
    /// The circle may extend past the map; cells are clipped to it.
    /// Returns `None` if `center` is outside the map.
    pub fn new<G: Grid + ?Sized>(grid: &G, center: Vec2, radius: f32) -> Option<Self> {
        let info = *grid.info();
        let window = SubmapIterator::new(grid, center, Vec2::splat(2.0 * radius.abs()))?;
        Some(Self {
            window,
            info,
            center,
            radius_sq: radius * radius,
        })
    }
}

impl Iterator for CircleIterator {
    type Item = UVec2;

    fn next(&mut self) -> Option<Self::Item> {
        let info = self.info;
        let center = self.center;
        let radius_sq = self.radius_sq;
        self.window
            .find(|cell| info.cell_center(*cell).distance_squared(center) <= radius_sq)
    }
}
