use crate::grid::LayeredGrid;
use crate::types::{FOOTPRINT_CACHE_LAYERS, TraversabilityError};

/// One generation of the traversability map.
///
/// The footprint cache layers always exist and start out invalid; cached
/// verdicts belong to the generation they were computed in and are dropped
/// together with it.
#[derive(Debug, Clone)]
pub struct TraversabilitySnapshot {
    grid: LayeredGrid,
    generation: u64,
}

impl TraversabilitySnapshot {
    /// Wrap `grid` as generation `generation`, (re)creating empty cache layers.
    pub fn new(mut grid: LayeredGrid, generation: u64) -> Self {
        for name in FOOTPRINT_CACHE_LAYERS {
            grid.add_layer(name);
        }
        Self { grid, generation }
    }

    /// Check that every layer in `required` exists.
    pub fn validate(grid: &LayeredGrid, required: &[&str]) -> Result<(), TraversabilityError> {
        match required.iter().find(|name| !grid.exists(name)) {
            Some(missing) => Err(TraversabilityError::MissingLayer((*missing).to_string())),
            None => Ok(()),
        }
    }

    pub fn grid(&self) -> &LayeredGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut LayeredGrid {
        &mut self.grid
    }

    pub fn into_grid(self) -> LayeredGrid {
        self.grid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate all cached footprint verdicts and move to the next generation.
    pub fn reset_caches(&mut self) {
        for name in FOOTPRINT_CACHE_LAYERS {
            if self.grid.exists(name) {
                self.grid.clear(name);
            } else {
                self.grid.add_layer(name);
            }
        }
        self.generation += 1;
    }
}
