use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::debug;

use crate::types::{Centroid, Region};

pub type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Area and eccentricity window a component must fall in to survive filtering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionWindow {
    pub area_min: u32,
    pub area_max: u32,
    pub max_eccentricity: f64,
}

impl Default for RegionWindow {
    fn default() -> Self {
        Self {
            area_min: 100,
            area_max: 3000,
            max_eccentricity: 0.9,
        }
    }
}

impl RegionWindow {
    pub fn accepts(&self, region: &Region) -> bool {
        (self.area_min..=self.area_max).contains(&region.area)
            && region.eccentricity <= self.max_eccentricity
    }
}

/// 8-connected labelling of the nonzero pixels of `mask`.
pub fn label(mask: &GrayImage) -> LabelImage {
    connected_components(mask, Connectivity::Eight, Luma([0u8]))
}

#[derive(Debug, Clone, Copy, Default)]
struct MomentSums {
    count: u64,
    sx: f64,
    sy: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

/// One [`Region`] per label, ordered by label.
pub fn regions(labels: &LabelImage) -> Vec<Region> {
    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    let mut sums = vec![MomentSums::default(); max_label + 1];

    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0] as usize;
        if label == 0 {
            continue;
        }
        let (fx, fy) = (f64::from(x), f64::from(y));
        let s = &mut sums[label];
        s.count += 1;
        s.sx += fx;
        s.sy += fy;
        s.sxx += fx * fx;
        s.syy += fy * fy;
        s.sxy += fx * fy;
    }

    sums.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, s)| s.count > 0)
        .map(|(label, s)| {
            let n = s.count as f64;
            let (cx, cy) = (s.sx / n, s.sy / n);
            let mu20 = s.sxx / n - cx * cx;
            let mu02 = s.syy / n - cy * cy;
            let mu11 = s.sxy / n - cx * cy;
            Region {
                label: label as u32,
                area: s.count as u32,
                eccentricity: eccentricity_from_covariance(mu20, mu02, mu11),
                centroid: Centroid { x: cx, y: cy },
            }
        })
        .collect()
}

/// Eccentricity of the ellipse with the given normalized second central moments.
pub fn eccentricity_from_covariance(mu20: f64, mu02: f64, mu11: f64) -> f64 {
    let (major, minor) = covariance_eigenvalues(mu20, mu02, mu11);
    if major <= 0.0 {
        return 0.0;
    }
    (1.0 - minor / major).clamp(0.0, 1.0).sqrt()
}

/// Eigenvalues of `[[mu20, mu11], [mu11, mu02]]`, largest first, clamped at zero.
pub fn covariance_eigenvalues(mu20: f64, mu02: f64, mu11: f64) -> (f64, f64) {
    let mean = (mu20 + mu02) / 2.0;
    let spread = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
    ((mean + spread).max(0.0), (mean - spread).max(0.0))
}

/// Keep only the components of `mask` that `window` accepts.
pub fn filter_regions(mask: &GrayImage, window: &RegionWindow) -> GrayImage {
    let labels = label(mask);
    let all = regions(&labels);

    let max_label = all.iter().map(|r| r.label).max().unwrap_or(0) as usize;
    let mut keep = vec![false; max_label + 1];
    for region in &all {
        keep[region.label as usize] = window.accepts(region);
    }
    debug!(
        total = all.len(),
        kept = keep.iter().filter(|&&k| k).count(),
        "filtered regions"
    );

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let label = labels.get_pixel(x, y)[0] as usize;
        if label != 0 && keep[label] {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// The largest region of `mask`, if it has any foreground.
pub fn largest_region(mask: &GrayImage) -> Option<Region> {
    regions(&label(mask)).into_iter().max_by_key(|r| r.area)
}
