use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::types::Centroid;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 2;

/// Draw a `BOX_THICKNESS` wide box around the square spanning `half_extent`
/// on every side of `centroid`. The stroke straddles the square's edge: one
/// pixel outside it and one on it.
pub fn draw_detection_box(canvas: &mut RgbImage, centroid: Centroid, half_extent: u32) {
    let half = f64::from(half_extent);
    let x0 = (centroid.x - half) as i32;
    let y0 = (centroid.y - half) as i32;
    let side = 2 * half_extent + 1;

    let outward = (BOX_THICKNESS / 2) as i32;
    for inset in -outward..(BOX_THICKNESS as i32 - outward) {
        let size = (side as i32 - 2 * inset).max(0) as u32;
        if size == 0 {
            break;
        }
        let rect = Rect::at(x0 + inset, y0 + inset).of_size(size, size);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_straddles_edge() {
        let mut canvas = RgbImage::new(60, 60);
        draw_detection_box(&mut canvas, Centroid { x: 30.0, y: 30.0 }, 10);

        // left edge at x = 20
        assert_eq!(*canvas.get_pixel(18, 30), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(19, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(20, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(21, 30), Rgb([0, 0, 0]));
        // right edge at x = 40
        assert_eq!(*canvas.get_pixel(40, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(41, 30), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(42, 30), Rgb([0, 0, 0]));
        assert_eq!(*canvas.get_pixel(40, 40), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(30, 30), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_box_clipped_at_border() {
        let mut canvas = RgbImage::new(20, 20);
        draw_detection_box(&mut canvas, Centroid { x: 2.0, y: 2.0 }, 10);
        assert_eq!(*canvas.get_pixel(12, 5), BOX_COLOR);
        assert_eq!(*canvas.get_pixel(13, 5), BOX_COLOR);
    }
}
