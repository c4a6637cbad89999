use image::{GrayImage, Luma};

use crate::grid::{Grid, LayeredGrid};

/// Gray level of invalid cells.
pub const INVALID_GRAY: u8 = 205;

/// Render one layer as a grayscale preview.
///
/// Values are scaled linearly from `range.0` (black) to `range.1` (white) and
/// clamped; invalid cells are mid-gray. The grid's y=0 row is written to the
/// bottom of the image. Returns `None` if the layer does not exist.
pub fn layer_to_image(grid: &LayeredGrid, layer: &str, range: (f32, f32)) -> Option<GrayImage> {
    let layer = grid.layer(layer)?;
    let (width, height) = (grid.width(), grid.height());
    let mut img = GrayImage::new(width, height);

    for y_img in 0..height {
        let y_grid = height - 1 - y_img;
        for x in 0..width {
            let value = layer
                .get(glam::UVec2::new(x, y_grid))
                .copied()
                .unwrap_or(f32::NAN);
            img.put_pixel(x, y_img, Luma([value_to_gray(value, range)]));
        }
    }

    Some(img)
}

/// Render a layer using the range of its valid values.
pub fn layer_to_image_auto(grid: &LayeredGrid, layer: &str) -> Option<GrayImage> {
    let values = grid.layer(layer)?.data();
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = if min.is_finite() { (min, max) } else { (0.0, 1.0) };
    layer_to_image(grid, layer, range)
}

fn value_to_gray(value: f32, (low, high): (f32, f32)) -> u8 {
    if !value.is_finite() {
        return INVALID_GRAY;
    }
    let span = high - low;
    if span <= 0.0 {
        return u8::MAX;
    }
    (((value - low) / span).clamp(0.0, 1.0) * 255.0).round() as u8
}
