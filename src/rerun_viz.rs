use std::error::Error;

use glam::Vec2;

use crate::grid::LayeredGrid;
use crate::types::{Polygon, StampedPolygon};
use crate::visualization::layer_to_image;

/// Color of footprint polygons.
pub fn footprint_color() -> rerun::Color {
    rerun::Color::from_rgb(0, 160, 255)
}

/// Color of untraversable polygons.
pub fn untraversable_color() -> rerun::Color {
    rerun::Color::from_rgb(255, 0, 0)
}

/// RGB texture of one layer, `None` if the layer is missing.
pub fn layer_to_rgb_bytes(
    grid: &LayeredGrid,
    layer: &str,
    range: (f32, f32),
) -> Option<(u32, u32, Vec<u8>)> {
    let gray = layer_to_image(grid, layer, range)?;
    let (width, height) = (gray.width(), gray.height());
    let rgb = gray.into_raw().iter().flat_map(|&v| [v, v, v]).collect();
    Some((width, height, rgb))
}

#[allow(clippy::too_many_arguments)]
pub fn log_textured_plane_mesh3d(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    origin_xy_world: Vec2,
    width_world: f32,
    height_world: f32,
    z_world: f32,
    texture_width: u32,
    texture_height: u32,
    rgb_bytes: Vec<u8>,
) -> Result<(), Box<dyn Error>> {
    rec.log(
        entity_path,
        &rerun::Mesh3D::new([
            [origin_xy_world.x, origin_xy_world.y + height_world, z_world],
            [origin_xy_world.x + width_world, origin_xy_world.y, z_world],
            [origin_xy_world.x, origin_xy_world.y, z_world],
            [
                origin_xy_world.x + width_world,
                origin_xy_world.y + height_world,
                z_world,
            ],
        ])
        .with_vertex_normals([[0.0, 0.0, 1.0]])
        .with_triangle_indices([[2, 1, 0], [3, 1, 0]])
        // Flip V to match the viewer's texture coordinate convention.
        .with_vertex_texcoords([[0.0, 0.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]])
        .with_albedo_texture(
            rerun::datatypes::ImageFormat {
                width: texture_width,
                height: texture_height,
                color_model: Some(rerun::datatypes::ColorModel::RGB),
                channel_datatype: Some(rerun::datatypes::ChannelDatatype::U8),
                ..Default::default()
            },
            rgb_bytes,
        ),
    )?;
    Ok(())
}

/// Log one layer of a grid as a textured plane at height `z_world`.
pub fn log_layer(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    grid: &LayeredGrid,
    layer: &str,
    range: (f32, f32),
    z_world: f32,
) -> Result<(), Box<dyn Error>> {
    let Some((width, height, rgb_bytes)) = layer_to_rgb_bytes(grid, layer, range) else {
        return Err(format!("layer '{layer}' does not exist").into());
    };
    let info = grid.info();
    log_textured_plane_mesh3d(
        rec,
        entity_path,
        info.origin,
        info.world_width(),
        info.world_height(),
        z_world,
        width,
        height,
        rgb_bytes,
    )
}

/// Closed outline of `polygon` at height `z`.
fn outline(polygon: &Polygon, z: f32) -> Vec<[f32; 3]> {
    polygon
        .points
        .iter()
        .chain(polygon.points.first())
        .map(|p| [p.x, p.y, z])
        .collect()
}

/// Log a stamped polygon as a closed line strip. Empty polygons clear the entity.
pub fn log_polygon(
    rec: &rerun::RecordingStream,
    entity_path: &str,
    polygon: &StampedPolygon,
    color: rerun::Color,
) -> Result<(), Box<dyn Error>> {
    if polygon.polygon.is_empty() {
        rec.log(entity_path, &rerun::Clear::flat())?;
        return Ok(());
    }
    let strip = rerun::LineStrips3D::new([outline(&polygon.polygon, polygon.z)]).with_colors([color]);
    rec.log(entity_path, &strip)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::types::{LAYER_TRAVERSABILITY, MapInfo};

    #[test]
    fn rgb_bytes_repeat_gray() {
        let mut grid = LayeredGrid::new(MapInfo::centered(2, 2, 1.0, Vec2::ZERO), "map");
        grid.add_layer_filled(LAYER_TRAVERSABILITY, 1.0);
        grid.set(LAYER_TRAVERSABILITY, UVec2::new(0, 0), 0.0).unwrap();

        let (width, height, rgb) = layer_to_rgb_bytes(&grid, LAYER_TRAVERSABILITY, (0.0, 1.0)).unwrap();
        assert_eq!((width, height), (2, 2));
        assert_eq!(rgb.len(), 12);
        // Grid cell (0, 0) lands in the bottom-left pixel.
        assert_eq!(&rgb[6..9], &[0, 0, 0]);
        assert_eq!(&rgb[0..3], &[255, 255, 255]);
    }

    #[test]
    fn outline_is_closed() {
        let points = outline(&Polygon::rectangle(1.0, 1.0), 0.5);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], points[4]);
        assert_eq!(points[0][2], 0.5);
    }
}
