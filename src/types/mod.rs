pub mod constants;
pub mod error;
pub mod geometry;
pub mod info;
pub mod polygon;

pub use constants::*;
pub use error::TraversabilityError;
pub use geometry::{Footprint, Pose};
pub use info::MapInfo;
pub use polygon::{Polygon, StampedPolygon};
