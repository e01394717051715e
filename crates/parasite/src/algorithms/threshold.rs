use image::{GrayImage, RgbImage};
use crate::traits::ThresholdEstimator;

/// Fixed first guess that splits an 8-bit channel in two.
pub const INITIAL_SPLIT: u8 = 127;

/// One-shot mean-of-means refinement of a fixed initial split.
///
/// Not an iterative convergence: the result is a single correction of
/// `split`, so callers must not treat it as optimal.
#[derive(Debug, Clone)]
pub struct MeanSplitThreshold {
    pub split: u8,
}

impl Default for MeanSplitThreshold {
    fn default() -> Self {
        Self { split: INITIAL_SPLIT }
    }
}

impl ThresholdEstimator for MeanSplitThreshold {
    fn estimate(&self, channel: &GrayImage) -> f64 {
        let (mut upper_sum, mut upper_count) = (0u64, 0u64);
        let (mut lower_sum, mut lower_count) = (0u64, 0u64);

        for pixel in channel.pixels() {
            let value = u64::from(pixel[0]);
            if pixel[0] > self.split {
                upper_sum += value;
                upper_count += 1;
            } else {
                lower_sum += value;
                lower_count += 1;
            }
        }

        let mean = |sum: u64, count: u64| sum as f64 / count as f64;
        match (upper_count, lower_count) {
            (0, 0) => f64::from(self.split),
            (0, _) => mean(lower_sum, lower_count),
            (_, 0) => mean(upper_sum, upper_count),
            _ => (mean(upper_sum, upper_count) + mean(lower_sum, lower_count)) / 2.0,
        }
    }
}

/// Extract one channel of an RGB image (0 = red).
pub fn channel(image: &RgbImage, index: usize) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([image.get_pixel(x, y)[index]])
    })
}

/// Inverted binary threshold: pixels at or below `threshold` become foreground (255).
pub fn binarize_inverted(channel: &GrayImage, threshold: f64) -> GrayImage {
    let level = threshold.floor().clamp(0.0, 255.0) as u8;
    let mut mask = imageproc::contrast::threshold(channel, level);
    image::imageops::invert(&mut mask);
    mask
}
