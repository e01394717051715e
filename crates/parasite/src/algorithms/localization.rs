use image::{GrayImage, RgbImage};
use tracing::debug;

use super::regions::{label, regions};
use crate::types::Centroid;

/// Half side of the square crop taken around every region centroid.
pub const CROP_HALF_EXTENT: u32 = 70;

/// A region centroid and the crop taken around it.
#[derive(Debug, Clone)]
pub struct Located {
    pub centroid: Centroid,
    pub crop: RgbImage,
}

/// Crop a `2 * half_extent` square around each component of `mask`.
///
/// The top-left corner is the centroid minus `half_extent`, truncated. Crops
/// that do not fit entirely inside `image` are dropped.
pub fn locate_candidates(image: &RgbImage, mask: &GrayImage, half_extent: u32) -> Vec<Located> {
    let side = 2 * half_extent;
    let (width, height) = image.dimensions();
    let half = f64::from(half_extent);

    regions(&label(mask))
        .into_iter()
        .filter_map(|region| {
            let c = region.centroid;
            let (x0, y0) = ((c.x - half) as i64, (c.y - half) as i64);
            let fits = side > 0
                && x0 >= 0
                && y0 >= 0
                && x0 + i64::from(side) <= i64::from(width)
                && y0 + i64::from(side) <= i64::from(height);
            if !fits {
                debug!(cx = c.x, cy = c.y, "crop outside image, dropping region");
                return None;
            }
            let crop = image::imageops::crop_imm(image, x0 as u32, y0 as u32, side, side).to_image();
            Some(Located { centroid: c, crop })
        })
        .collect()
}
