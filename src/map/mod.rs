//! The traversability map service: map ownership, the filter pipeline seam,
//! publishing and the terrain window.

pub mod manager;
pub mod pipeline;
pub mod publisher;
pub mod terrain;

pub use manager::TraversabilityMap;
pub use pipeline::FilterPipeline;
pub use publisher::{MapPublisher, NullPublisher, Topic};
pub use terrain::{CameraModel, MaskClassifier, TerrainClass, TerrainClassifier};
