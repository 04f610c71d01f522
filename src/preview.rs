//! Raster previews of frames: one scaled block per LED, in logical
//! (row, col) order so the picture matches what the panel shows.

use image::RgbImage;

use crate::grid::{COLS, Frame, ROWS};

/// Render a frame to an RGB image with `scale`×`scale` pixels per LED.
pub fn render_image(frame: &Frame, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let mut img = RgbImage::new(COLS as u32 * scale, ROWS as u32 * scale);
    for row in 0..ROWS {
        for col in 0..COLS {
            let led = frame.get(row, col);
            let pixel = image::Rgb([led.r, led.g, led.b]);
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(col as u32 * scale + dx, row as u32 * scale + dy, pixel);
                }
            }
        }
    }
    img
}
