use crate::grid::LayeredGrid;
use crate::types::TraversabilityError;

/// Filter chain turning an elevation map into traversability layers.
///
/// `apply` gets a private copy of the current elevation map and returns a grid
/// with at least the `traversability`, `slope`, `step` and `roughness` layers.
/// Indicator layers use 0 for "flagged" and any other value for "fine".
pub trait FilterPipeline: Send {
    /// (Re)load the filter chain configuration.
    fn configure(&mut self) -> Result<(), TraversabilityError> {
        Ok(())
    }

    fn apply(&mut self, elevation: &LayeredGrid) -> Result<LayeredGrid, TraversabilityError>;
}

impl<F> FilterPipeline for F
where
    F: FnMut(&LayeredGrid) -> Result<LayeredGrid, TraversabilityError> + Send,
{
    fn apply(&mut self, elevation: &LayeredGrid) -> Result<LayeredGrid, TraversabilityError> {
        self(elevation)
    }
}
