//! Serialized grid snapshot exchanged with the map transport.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid2d, LayeredGrid};
use crate::types::{MapInfo, TraversabilityError};

/// Transport form of a [`LayeredGrid`]: geometry, frame, absolute height offset
/// and row-major layer data (NaN marks invalid cells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMessage {
    pub frame_id: String,
    pub resolution: f32,
    pub width: u32,
    pub height: u32,
    /// Corner of cell (0, 0) in the message frame.
    pub origin: [f32; 2],
    /// Absolute z of the map frame origin.
    #[serde(default)]
    pub z_offset: f32,
    pub layers: BTreeMap<String, Vec<f32>>,
}

impl GridMessage {
    pub fn from_grid(grid: &LayeredGrid, z_offset: f32) -> Self {
        let info = grid.info();
        let layers = grid
            .layer_names()
            .filter_map(|name| Some((name.to_string(), grid.layer(name)?.data().to_vec())))
            .collect();
        Self {
            frame_id: grid.frame_id().to_string(),
            resolution: info.resolution,
            width: info.width,
            height: info.height,
            origin: info.origin.to_array(),
            z_offset,
            layers,
        }
    }

    /// Rebuild the grid; returns it with the message's z offset.
    pub fn into_grid(self) -> Result<(LayeredGrid, f32), TraversabilityError> {
        if self.resolution.is_nan() || self.resolution <= 0.0 {
            return Err(TraversabilityError::InvalidMetadata(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        let info = MapInfo {
            width: self.width,
            height: self.height,
            resolution: self.resolution,
            origin: Vec2::from_array(self.origin),
        };
        let mut grid = LayeredGrid::new(info, self.frame_id);
        for (name, data) in self.layers {
            grid.insert_layer(&name, Grid2d::new(info, data)?)?;
        }
        Ok((grid, self.z_offset))
    }
}
