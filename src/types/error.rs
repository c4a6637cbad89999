use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraversabilityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("received map has frame_id '{received}', but '{expected}' is expected")]
    FrameMismatch { expected: String, received: String },
    #[error("missing layer '{0}'")]
    MissingLayer(String),
    #[error("filter pipeline failed: {0}")]
    PipelineFailure(String),
    #[error("elevation map is not initialized")]
    ElevationUninitialized,
    #[error("traversability map is not initialized")]
    TraversabilityUninitialized,
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}
