use glam::{UVec2, Vec2};

use crate::types::MapInfo;

/// Shared geometry interface for single-layer and layered grids.
pub trait Grid {
    fn info(&self) -> &MapInfo;

    fn width(&self) -> u32 {
        self.info().width
    }
    fn height(&self) -> u32 {
        self.info().height
    }
    fn resolution(&self) -> f32 {
        self.info().resolution
    }

    /// World position of the center of `cell`.
    fn cell_center(&self, cell: UVec2) -> Vec2 {
        self.info().cell_center(cell)
    }
    /// Cell containing `pos`, `None` outside the map.
    fn world_to_cell(&self, pos: Vec2) -> Option<UVec2> {
        self.info().world_to_cell(pos)
    }
    fn is_inside(&self, pos: Vec2) -> bool {
        self.info().is_inside(pos)
    }
}
