use std::collections::BTreeMap;
use std::ops::Range;

use image::{GrayImage, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::{DetectError, Result};

/// Key under which detections are reported.
pub const ELEMENT_NAME: &str = "parasite";

/// Reported box side. The drawn rectangle spans twice this around the centroid.
pub const DETECTION_SIZE: i32 = 70;

pub const MORPHOLOGY_LEN: usize = 13;
pub const TEXTURE_LEN: usize = 7;
pub const COLOR_LEN: usize = 12;
pub const SUBSTRUCTURE_LEN: usize = MORPHOLOGY_LEN + TEXTURE_LEN + COLOR_LEN;
pub const FEATURE_LEN: usize = SUBSTRUCTURE_LEN * 3;

/// Region centroid in padded-image coordinates (column, row).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub x: f64,
    pub y: f64,
}

/// A connected mask component. Lives only until candidates are cropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Label assigned by connected-component labelling
    pub label: u32,
    /// Pixel count
    pub area: u32,
    pub eccentricity: f64,
    pub centroid: Centroid,
}

/// A positive detection, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Detection {
    pub fn from_centroid(centroid: Centroid) -> Self {
        let half = f64::from(DETECTION_SIZE);
        Self {
            x: (centroid.x - half) as i32,
            y: (centroid.y - half) as i32,
            w: DETECTION_SIZE,
            h: DETECTION_SIZE,
        }
    }
}

/// Serialized analysis result: element name to its detections.
pub type Report = BTreeMap<String, Vec<Detection>>;

/// The three sub-structures whose features make up a vector, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SubStructure {
    Nucleus,
    Kinetoplast,
    Cytoplasm,
}

impl SubStructure {
    /// Field range of this sub-structure inside a [`FeatureVector`].
    pub fn range(self) -> Range<usize> {
        let start = self as usize * SUBSTRUCTURE_LEN;
        start..start + SUBSTRUCTURE_LEN
    }
}

/// Fixed-length classifier input.
///
/// Layout per sub-structure: 13 morphological, 7 texture and 12 color values,
/// sub-structures in [`SubStructure`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn from_parts(
        nucleus: &[f64; SUBSTRUCTURE_LEN],
        kinetoplast: &[f64; SUBSTRUCTURE_LEN],
        cytoplasm: &[f64; SUBSTRUCTURE_LEN],
    ) -> Self {
        let mut values = [0.0; FEATURE_LEN];
        values[SubStructure::Nucleus.range()].copy_from_slice(nucleus);
        values[SubStructure::Kinetoplast.range()].copy_from_slice(kinetoplast);
        values[SubStructure::Cytoplasm.range()].copy_from_slice(cytoplasm);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn substructure(&self, part: SubStructure) -> &[f64] {
        &self.0[part.range()]
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = DetectError;

    fn try_from(values: &[f64]) -> Result<Self> {
        let values: [f64; FEATURE_LEN] =
            values.try_into().map_err(|_| DetectError::FeatureLength {
                expected: FEATURE_LEN,
                actual: values.len(),
            })?;
        Ok(Self(values))
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = DetectError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::try_from(values.as_slice())
    }
}

/// Nucleus, kinetoplast and cytoplasm masks of one crop.
#[derive(Debug, Clone)]
pub struct SubMasks {
    pub nucleus: GrayImage,
    pub kinetoplast: GrayImage,
    pub cytoplasm: GrayImage,
}

/// A cropped region that made it through sub-structure location.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Index into the localizer output
    pub index: usize,
    pub centroid: Centroid,
    pub crop: RgbImage,
    pub masks: SubMasks,
    pub features: FeatureVector,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_substructure_ranges_tile_the_vector() {
        let ranges: Vec<_> = SubStructure::iter().map(SubStructure::range).collect();
        assert_eq!(ranges[0], 0..32);
        assert_eq!(ranges[1], 32..64);
        assert_eq!(ranges[2], 64..96);
    }

    #[test]
    fn test_feature_vector_rejects_wrong_length() {
        let err = FeatureVector::try_from(vec![0.0; 95]).unwrap_err();
        assert!(matches!(err, DetectError::FeatureLength { expected: 96, actual: 95 }));
        assert!(FeatureVector::try_from(vec![1.0; 96]).is_ok());
    }

    #[test]
    fn test_from_parts_keeps_order() {
        let v = FeatureVector::from_parts(&[1.0; 32], &[2.0; 32], &[3.0; 32]);
        assert!(v.substructure(SubStructure::Nucleus).iter().all(|&x| x == 1.0));
        assert!(v.substructure(SubStructure::Kinetoplast).iter().all(|&x| x == 2.0));
        assert!(v.substructure(SubStructure::Cytoplasm).iter().all(|&x| x == 3.0));
    }

    #[test]
    fn test_detection_from_centroid_truncates() {
        let d = Detection::from_centroid(Centroid { x: 150.7, y: 99.2 });
        assert_eq!(d, Detection { x: 80, y: 29, w: 70, h: 70 });
    }
}
