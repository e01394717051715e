use image::{GrayImage, RgbImage};

use crate::types::COLOR_LEN;

/// Mean, standard deviation, skewness and excess kurtosis of one channel.
///
/// Population (biased) estimators. A constant channel has zero skew and kurtosis.
fn moments(values: &[f64]) -> [f64; 4] {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    m2 /= n;
    m3 /= n;
    m4 /= n;

    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return [mean, m2.sqrt(), 0.0, 0.0];
    }
    [mean, m2.sqrt(), m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0]
}

/// Per-channel statistics over the masked pixels of `crop`.
///
/// Layout: three means, three deviations, three skews, three kurtoses, each
/// in B, G, R order. All zeros for an empty mask.
pub fn color_features(crop: &RgbImage, mask: &GrayImage) -> [f64; COLOR_LEN] {
    let mut channels: [Vec<f64>; 3] = Default::default();
    for (pixel, m) in crop.pixels().zip(mask.pixels()) {
        if m[0] == 0 {
            continue;
        }
        for (channel, &value) in channels.iter_mut().zip(pixel.0.iter()) {
            channel.push(f64::from(value));
        }
    }

    let mut out = [0.0; COLOR_LEN];
    if channels[0].is_empty() {
        return out;
    }
    for (c, values) in channels.iter().enumerate() {
        let stats = moments(values);
        for (s, value) in stats.into_iter().enumerate() {
            out[s * 3 + (2 - c)] = value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_empty_mask_is_all_zero() {
        let crop = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        assert_eq!(color_features(&crop, &GrayImage::new(4, 4)), [0.0; 12]);
    }

    #[test]
    fn test_constant_pixels() {
        let crop = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let mask = GrayImage::from_pixel(4, 4, Luma([255]));
        let f = color_features(&crop, &mask);
        assert_eq!(&f[0..3], &[30.0, 20.0, 10.0]);
        assert_eq!(&f[3..], &[0.0; 9]);
    }

    #[test]
    fn test_only_masked_pixels_count() {
        let crop = RgbImage::from_fn(4, 1, |x, _| Rgb([(x * 10) as u8, 0, 0]));
        // keep values 0 and 20
        let mask = GrayImage::from_raw(4, 1, vec![255, 0, 255, 0]).expect("valid buffer");
        let f = color_features(&crop, &mask);
        // red is the last of each group
        assert_eq!(f[2], 10.0);
        assert_eq!(f[5], 10.0);
        // symmetric two-point distribution
        assert!(f[8].abs() < 1e-12);
        assert!((f[11] + 2.0).abs() < 1e-12);
        assert_eq!(f[0], 0.0);
    }

    #[test]
    fn test_skewed_distribution() {
        let values = [0.0, 0.0, 0.0, 10.0];
        let [mean, std, skew, _] = moments(&values);
        assert_eq!(mean, 2.5);
        assert!((std - 18.75f64.sqrt()).abs() < 1e-12);
        assert!(skew > 1.0);
    }
}
