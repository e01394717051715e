use std::f64::consts::PI;

use image::GrayImage;

use crate::algorithms::contours::{external_contours, largest_contour};
use crate::algorithms::regions::largest_region;
use crate::types::MORPHOLOGY_LEN;

/// Contours with fewer corner points skip the ellipse, hull and region terms.
pub const MIN_SHAPE_POINTS: usize = 5;

/// Shape descriptors of the largest external contour of `mask`.
///
/// Layout: area, perimeter, compactness, elongation, solidity, eccentricity,
/// then the seven Hu moments. All zeros when the mask has no contour.
pub fn morphological_features(mask: &GrayImage) -> [f64; MORPHOLOGY_LEN] {
    let mut out = [0.0; MORPHOLOGY_LEN];

    let contours = external_contours(mask);
    let Some(contour) = largest_contour(&contours) else {
        return out;
    };

    let moments = contour.moments();
    let area = moments.m00.abs();
    let perimeter = contour.perimeter();

    out[0] = area;
    out[1] = perimeter;
    out[2] = if area != 0.0 {
        perimeter * perimeter / (4.0 * PI * area)
    } else {
        0.0
    };

    if contour.corners.len() >= MIN_SHAPE_POINTS {
        out[3] = moments.elongation();
        let hull_area = contour.convex_hull_area();
        out[4] = if hull_area > 0.0 { area / hull_area } else { 0.0 };
        out[5] = largest_region(mask).map_or(0.0, |r| r.eccentricity);
    }

    out[6..].copy_from_slice(&moments.hu());
    out
}
