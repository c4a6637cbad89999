pub mod grid2d;
pub mod layered;
pub mod message;
pub mod traits;

pub use grid2d::Grid2d;
pub use layered::LayeredGrid;
pub use message::GridMessage;
pub use traits::Grid;
