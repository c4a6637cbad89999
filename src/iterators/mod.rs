//! Cell traversal patterns over grid geometry.
//!
//! Iterators only borrow the grid while they are constructed, so callers can
//! mutate layers of the same grid while walking the yielded cells.

pub mod circle;
pub mod line;
pub mod polygon;
pub mod spiral;
pub mod submap;

pub use circle::CircleIterator;
pub use line::LineIterator;
pub use polygon::PolygonIterator;
pub use spiral::{SpiralCell, SpiralIterator};
pub use submap::SubmapIterator;
