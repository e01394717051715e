//! Per-mask feature extraction.
//!
//! Every sub-structure mask yields the same 32 values regardless of how
//! degenerate it is: missing pieces are zero-filled, never skipped.

pub mod color;
pub mod morphology;
pub mod texture;

pub use color::color_features;
pub use morphology::morphological_features;
pub use texture::texture_features;

use image::{GrayImage, RgbImage};

use crate::types::{FeatureVector, MORPHOLOGY_LEN, SUBSTRUCTURE_LEN, SubMasks, TEXTURE_LEN};

/// Morphological, texture and color features of one mask, concatenated.
pub fn extract_features(crop: &RgbImage, mask: &GrayImage) -> [f64; SUBSTRUCTURE_LEN] {
    let mut out = [0.0; SUBSTRUCTURE_LEN];
    out[..MORPHOLOGY_LEN].copy_from_slice(&morphological_features(mask));
    out[MORPHOLOGY_LEN..MORPHOLOGY_LEN + TEXTURE_LEN].copy_from_slice(&texture_features(crop, mask));
    out[MORPHOLOGY_LEN + TEXTURE_LEN..].copy_from_slice(&color_features(crop, mask));
    out
}

/// Full classifier input for one crop: nucleus, kinetoplast, cytoplasm.
pub fn feature_vector(crop: &RgbImage, masks: &SubMasks) -> FeatureVector {
    FeatureVector::from_parts(
        &extract_features(crop, &masks.nucleus),
        &extract_features(crop, &masks.kinetoplast),
        &extract_features(crop, &masks.cytoplasm),
    )
}
