//! Multi-layer grid: named `f32` channels sharing one geometry.
//!
//! A cell holds either a finite value or [`INVALID`](crate::types::INVALID) (NaN)
//! for "no data". Layers are addressed by name; every layer has exactly the
//! geometry described by the grid's [`MapInfo`].

use std::collections::BTreeMap;

use glam::{UVec2, Vec2};

use crate::grid::{Grid, Grid2d};
use crate::iterators::SubmapIterator;
use crate::types::{INVALID, MapInfo, TraversabilityError};

#[derive(Debug, Clone)]
pub struct LayeredGrid {
    info: MapInfo,
    frame_id: String,
    layers: BTreeMap<String, Grid2d<f32>>,
}

impl LayeredGrid {
    pub fn new(info: MapInfo, frame_id: impl Into<String>) -> Self {
        Self {
            info,
            frame_id: frame_id.into(),
            layers: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub fn set_frame_id(&mut self, frame_id: impl Into<String>) {
        self.frame_id = frame_id.into();
    }

    /// Add (or reset) a layer with every cell invalid.
    pub fn add_layer(&mut self, name: &str) {
        self.add_layer_filled(name, INVALID);
    }

    /// Add (or overwrite) a layer with every cell set to `value`.
    pub fn add_layer_filled(&mut self, name: &str, value: f32) {
        self.layers
            .insert(name.to_string(), Grid2d::filled(self.info, value));
    }

    /// Insert an existing raster as a layer. Its geometry must match the grid's.
    pub fn insert_layer(
        &mut self,
        name: &str,
        layer: Grid2d<f32>,
    ) -> Result<(), TraversabilityError> {
        if *layer.info() != self.info {
            return Err(TraversabilityError::InvalidMetadata(format!(
                "layer '{}' geometry {:?} does not match grid geometry {:?}",
                name,
                layer.info(),
                self.info
            )));
        }
        self.layers.insert(name.to_string(), layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, name: &str) -> Option<Grid2d<f32>> {
        self.layers.remove(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn layer(&self, name: &str) -> Option<&Grid2d<f32>> {
        self.layers.get(name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Grid2d<f32>> {
        self.layers.get_mut(name)
    }

    /// Raw value of `name` at `cell`; `None` if the layer is missing or the cell is outside.
    pub fn at(&self, name: &str, cell: UVec2) -> Option<f32> {
        self.layers.get(name)?.get(cell).copied()
    }

    /// Raw value of `name` at `cell`, [`INVALID`] when it cannot be read.
    #[inline]
    pub fn value(&self, name: &str, cell: UVec2) -> f32 {
        self.at(name, cell).unwrap_or(INVALID)
    }

    /// Whether `name` holds a finite value at `cell`.
    #[inline]
    pub fn is_valid(&self, name: &str, cell: UVec2) -> bool {
        self.value(name, cell).is_finite()
    }

    pub fn at_position(&self, name: &str, pos: Vec2) -> Option<f32> {
        self.at(name, self.info.world_to_cell(pos)?)
    }

    pub fn set(&mut self, name: &str, cell: UVec2, value: f32) -> Result<(), TraversabilityError> {
        self.layers
            .get_mut(name)
            .ok_or_else(|| TraversabilityError::MissingLayer(name.to_string()))?
            .set(cell, value)
    }

    /// Invalidate every cell of `name` if the layer exists.
    pub fn clear(&mut self, name: &str) {
        if let Some(layer) = self.layers.get_mut(name) {
            layer.fill(INVALID);
        }
    }

    /// Copy of the cells covering the `length` rectangle centered at `center`,
    /// clipped to the map. `None` if `center` is outside the map.
    pub fn submap(&self, center: Vec2, length: Vec2) -> Option<LayeredGrid> {
        let region = SubmapIterator::new(self, center, length)?;
        let min = region.min_cell();
        let size = region.size();
        let info = MapInfo {
            width: size.x,
            height: size.y,
            resolution: self.info.resolution,
            origin: self.info.origin + min.as_vec2() * self.info.resolution,
        };

        let mut submap = LayeredGrid::new(info, self.frame_id.clone());
        for (name, layer) in &self.layers {
            let values =
                Grid2d::from_fn(info, |x, y| layer.get(min + UVec2::new(x, y)).copied().unwrap_or(INVALID));
            submap.layers.insert(name.clone(), values);
        }
        Some(submap)
    }
}

impl Grid for LayeredGrid {
    fn info(&self) -> &MapInfo {
        &self.info
    }
}
