use std::path::{Path, PathBuf};

use glam::Vec2;
use image::GenericImageView;
use serde::Deserialize;

use crate::grid::{Grid2d, LayeredGrid};
use crate::types::{INVALID, LAYER_ELEVATION, MapInfo, TraversabilityError};

/// Metadata file next to a height image, in the style of a map server YAML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ElevationMetadata {
    image: String,
    #[serde(deserialize_with = "deserialize_resolution")]
    resolution: f32,
    /// `[x, y, yaw]` of the lower-left pixel.
    origin: [f32; 3],
    #[serde(default = "default_frame_id")]
    frame_id: String,
    /// Height of a black pixel.
    min_height: f32,
    /// Height of a white pixel.
    max_height: f32,
}

fn default_frame_id() -> String {
    "map".to_string()
}

fn deserialize_resolution<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("resolution must be positive"))
    }
}

/// Load an elevation map from a YAML metadata file and an 8 or 16 bit
/// grayscale PNG. Pixel intensity is scaled linearly between `min_height` and
/// `max_height`; fully transparent pixels are invalid. The bottom image row
/// becomes grid row 0.
pub fn load_elevation_map(yaml_path: impl AsRef<Path>) -> Result<LayeredGrid, TraversabilityError> {
    let yaml_path = yaml_path.as_ref();
    let yaml_str = std::fs::read_to_string(yaml_path)?;
    let metadata: ElevationMetadata = serde_yaml::from_str(&yaml_str)?;

    if metadata.max_height < metadata.min_height {
        return Err(TraversabilityError::InvalidMetadata(
            "max_height must not be lower than min_height".to_string(),
        ));
    }
    if metadata.origin[2] != 0.0 {
        log::warn!(
            "Elevation map origin yaw {} is not supported and is ignored",
            metadata.origin[2]
        );
    }

    let image_path = resolve_image_path(yaml_path, &metadata.image);
    let image = image::open(&image_path)?;
    let (width, height) = image.dimensions();
    let pixels = image.to_luma_alpha16();
    let span = metadata.max_height - metadata.min_height;

    let info = MapInfo {
        width,
        height,
        resolution: metadata.resolution,
        origin: Vec2::new(metadata.origin[0], metadata.origin[1]),
    };
    let elevation = Grid2d::from_fn(info, |x, grid_y| {
        let [luma, alpha] = pixels.get_pixel(x, height - grid_y - 1).0;
        if alpha == 0 {
            INVALID
        } else {
            metadata.min_height + span * f32::from(luma) / f32::from(u16::MAX)
        }
    });

    log::info!(
        "Loaded {width} x {height} elevation map from {}",
        image_path.display()
    );
    let mut grid = LayeredGrid::new(info, metadata.frame_id);
    grid.insert_layer(LAYER_ELEVATION, elevation)?;
    Ok(grid)
}

fn resolve_image_path(yaml_path: &Path, image_ref: &str) -> PathBuf {
    let image_path = PathBuf::from(image_ref);
    if image_path.is_absolute() {
        return image_path;
    }

    match yaml_path.parent() {
        Some(parent) => parent.join(image_path),
        None => image_path,
    }
}
