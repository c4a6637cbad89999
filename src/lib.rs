//! Footprint and path traversability queries over layered terrain grids.

pub mod grid;
pub mod iterators;
pub mod loaders;
pub mod map;
#[cfg(feature = "rerun")]
pub mod rerun_viz;
pub mod traversability;
pub mod types;
pub mod visualization;

pub use grid::{Grid, Grid2d, GridMessage, LayeredGrid};
pub use loaders::load_elevation_map;
pub use map::{FilterPipeline, MapPublisher, TraversabilityMap};
pub use traversability::{FootprintPath, PathCheck, TraversabilityConfig, TraversabilityResult};
pub use types::{Footprint, MapInfo, Polygon, Pose, TraversabilityError};
