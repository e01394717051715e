use image::{GrayImage, Luma, RgbImage};

use crate::types::TEXTURE_LEN;

const LEVELS: usize = 256;

/// Luma of `crop` with everything outside `mask` set to zero.
pub fn masked_gray(crop: &RgbImage, mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(crop.width(), crop.height(), |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            return Luma([0]);
        }
        let [r, g, b] = crop.get_pixel(x, y).0;
        let luma = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Symmetric, normalized co-occurrence matrix at distance 1, angle 0.
///
/// Returns `None` when the image has no horizontal neighbour pairs.
pub fn cooccurrence(gray: &GrayImage) -> Option<Vec<f64>> {
    let mut glcm = vec![0.0; LEVELS * LEVELS];
    let mut total = 0.0;
    for row in gray.rows() {
        let values: Vec<usize> = row.map(|p| usize::from(p[0])).collect();
        for pair in values.windows(2) {
            let (i, j) = (pair[0], pair[1]);
            glcm[i * LEVELS + j] += 1.0;
            glcm[j * LEVELS + i] += 1.0;
            total += 2.0;
        }
    }
    if total == 0.0 {
        return None;
    }
    glcm.iter_mut().for_each(|v| *v /= total);
    Some(glcm)
}

/// Base-2 Shannon entropy of the gray-level histogram.
pub fn shannon_entropy(gray: &GrayImage) -> f64 {
    let mut histogram = [0u64; LEVELS];
    for p in gray.pixels() {
        histogram[usize::from(p[0])] += 1;
    }
    let n = (gray.width() as u64 * gray.height() as u64) as f64;
    if n == 0.0 {
        return 0.0;
    }
    histogram
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

/// Contrast, energy, dissimilarity, homogeneity, correlation, ASM and entropy
/// of the masked crop. All zeros for an empty mask.
pub fn texture_features(crop: &RgbImage, mask: &GrayImage) -> [f64; TEXTURE_LEN] {
    if !mask.pixels().any(|p| p[0] != 0) {
        return [0.0; TEXTURE_LEN];
    }
    let gray = masked_gray(crop, mask);
    let Some(glcm) = cooccurrence(&gray) else {
        return [0.0; TEXTURE_LEN];
    };

    let (mut contrast, mut dissimilarity, mut homogeneity, mut asm) = (0.0, 0.0, 0.0, 0.0);
    let (mut mean_i, mut mean_j) = (0.0, 0.0);
    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let p = glcm[i * LEVELS + j];
            if p == 0.0 {
                continue;
            }
            let d = i as f64 - j as f64;
            contrast += p * d * d;
            dissimilarity += p * d.abs();
            homogeneity += p / (1.0 + d * d);
            asm += p * p;
            mean_i += p * i as f64;
            mean_j += p * j as f64;
        }
    }

    let (mut var_i, mut var_j, mut cov) = (0.0, 0.0, 0.0);
    for i in 0..LEVELS {
        for j in 0..LEVELS {
            let p = glcm[i * LEVELS + j];
            if p == 0.0 {
                continue;
            }
            let di = i as f64 - mean_i;
            let dj = j as f64 - mean_j;
            var_i += p * di * di;
            var_j += p * dj * dj;
            cov += p * di * dj;
        }
    }
    let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
    let correlation = if std_i < 1e-15 || std_j < 1e-15 {
        1.0
    } else {
        cov / (std_i * std_j)
    };

    [
        contrast,
        asm.sqrt(),
        dissimilarity,
        homogeneity,
        correlation,
        asm,
        shannon_entropy(&gray),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn full_mask(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255]))
    }

    #[test]
    fn test_empty_mask_is_all_zero() {
        let crop = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        assert_eq!(texture_features(&crop, &GrayImage::new(8, 8)), [0.0; 7]);
    }

    #[test]
    fn test_uniform_patch() {
        let crop = RgbImage::from_pixel(8, 8, Rgb([100, 100, 100]));
        let t = texture_features(&crop, &full_mask(8, 8));
        assert_eq!(t[0], 0.0, "contrast");
        assert!((t[1] - 1.0).abs() < 1e-12, "energy");
        assert_eq!(t[2], 0.0, "dissimilarity");
        assert!((t[3] - 1.0).abs() < 1e-12, "homogeneity");
        assert_eq!(t[4], 1.0, "correlation of a constant patch");
        assert!((t[5] - 1.0).abs() < 1e-12, "asm");
        assert_eq!(t[6], 0.0, "entropy");
    }

    #[test]
    fn test_alternating_columns() {
        // gray values alternate 0 / 100 along each row
        let crop = RgbImage::from_fn(4, 2, |x, _| if x % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([100, 100, 100]) });
        let t = texture_features(&crop, &full_mask(4, 2));
        assert!((t[0] - 10_000.0).abs() < 1e-9, "contrast {}", t[0]);
        assert!((t[2] - 100.0).abs() < 1e-9);
        assert!((t[4] + 1.0).abs() < 1e-9, "perfect anti-correlation {}", t[4]);
        assert!((t[5] - 0.5).abs() < 1e-12, "two equal cells");
        assert!((t[6] - 1.0).abs() < 1e-12, "one bit of entropy");
    }

    #[test]
    fn test_masked_gray_zeroes_outside() {
        let crop = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        let mask = GrayImage::from_raw(3, 1, vec![0, 255, 0]).expect("valid buffer");
        assert_eq!(masked_gray(&crop, &mask).into_raw(), vec![0, 255, 0]);
    }
}
