//! Terrain map: a window of the traversability map around the robot, colored
//! by a camera-based terrain classification.

use glam::{Affine3A, Vec2, Vec3};
use image::RgbImage;

use crate::grid::{Grid, LayeredGrid};
use crate::types::{LAYER_COLOR, LAYER_ELEVATION, LAYER_TERRAIN_TRAVERSABILITY};

/// Size (x, y) in meters of the terrain window around the robot.
pub const TERRAIN_SUBMAP_LENGTH: Vec2 = Vec2::new(2.5, 1.5);

/// Mask color of plain floor.
pub const FLOOR_RGB: [u8; 3] = [155, 155, 155];
/// Mask color of marked floor.
pub const MARKED_RGB: [u8; 3] = [0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainClass {
    Floor,
    Marked,
    Other,
}

impl TerrainClass {
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        match rgb {
            FLOOR_RGB => Self::Floor,
            MARKED_RGB => Self::Marked,
            _ => Self::Other,
        }
    }

    /// Traversability cost written to `terrain_traversability`.
    pub fn cost(&self) -> f32 {
        match self {
            Self::Floor => 1.0,
            Self::Marked => 0.5,
            Self::Other => 0.35,
        }
    }

    /// Display color; marked floor is shown like floor.
    pub fn display_color(&self) -> [u8; 3] {
        match self {
            Self::Floor | Self::Marked => FLOOR_RGB,
            Self::Other => MARKED_RGB,
        }
    }
}

/// Assigns a terrain class to a 3D point of the map, or `None` when it cannot tell.
pub trait TerrainClassifier: Send + Sync {
    fn classify(&self, position: Vec3) -> Option<TerrainClass>;
}

/// Pinhole camera with its pose relative to the map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
    pub width: u32,
    pub height: u32,
    /// Map frame to optical frame (z forward, x right, y down).
    pub world_to_camera: Affine3A,
}

impl CameraModel {
    /// Pixel coordinates of a map point, `None` if it is behind the camera or off the image.
    pub fn project(&self, position: Vec3) -> Option<Vec2> {
        let p = self.world_to_camera.transform_point3(position);
        if p.z <= 0.0 {
            return None;
        }
        let pixel = Vec2::new(self.fx * p.x / p.z + self.cx, self.fy * p.y / p.z + self.cy);
        let inside = pixel.x >= 0.0
            && pixel.y >= 0.0
            && pixel.x < self.width as f32
            && pixel.y < self.height as f32;
        inside.then_some(pixel)
    }
}

/// Looks up the nearest pixel of a semantic mask image.
#[derive(Debug, Clone)]
pub struct MaskClassifier {
    camera: CameraModel,
    mask: RgbImage,
}

impl MaskClassifier {
    pub fn new(camera: CameraModel, mask: RgbImage) -> Self {
        Self { camera, mask }
    }
}

impl TerrainClassifier for MaskClassifier {
    fn classify(&self, position: Vec3) -> Option<TerrainClass> {
        let pixel = self.camera.project(position)?;
        let rgb = self.mask.get_pixel_checked(pixel.x as u32, pixel.y as u32)?;
        Some(TerrainClass::from_rgb(rgb.0))
    }
}

/// Cut the terrain window centered on `robot_position`.
pub fn downsample_around(grid: &LayeredGrid, robot_position: Vec2) -> Option<LayeredGrid> {
    let submap = grid.submap(robot_position, TERRAIN_SUBMAP_LENGTH)?;
    log::info!(
        "Terrain submap created with size {:.2} x {:.2} m ({} x {} cells)",
        submap.info().world_width(),
        submap.info().world_height(),
        submap.width(),
        submap.height()
    );
    Some(submap)
}

/// Classify every cell with a valid elevation and write `terrain_traversability`
/// and `color`. Returns the number of classified cells.
pub fn assign_terrain_cost(grid: &mut LayeredGrid, classifier: &dyn TerrainClassifier) -> usize {
    grid.add_layer(LAYER_TERRAIN_TRAVERSABILITY);
    grid.add_layer(LAYER_COLOR);

    let info = *grid.info();
    let mut classified = 0;
    for y in 0..info.height {
        for x in 0..info.width {
            let cell = glam::UVec2::new(x, y);
            let elevation = grid.value(LAYER_ELEVATION, cell);
            if !elevation.is_finite() {
                continue;
            }
            let Some(class) = classifier.classify(info.cell_center(cell).extend(elevation)) else {
                continue;
            };
            let _ = grid.set(LAYER_TERRAIN_TRAVERSABILITY, cell, class.cost());
            let _ = grid.set(LAYER_COLOR, cell, color_to_value(class.display_color()));
            classified += 1;
        }
    }
    log::debug!("Classified {classified} terrain cells");
    classified
}

/// Pack an RGB color into the bits of a float cell value.
pub fn color_to_value(rgb: [u8; 3]) -> f32 {
    let [r, g, b] = rgb.map(u32::from);
    f32::from_bits((r << 16) | (g << 8) | b)
}

pub fn value_to_color(value: f32) -> [u8; 3] {
    let bits = value.to_bits();
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}
