use image::{GrayImage, RgbImage};
use crate::{error::Result, types::FeatureVector};

/// Label a classifier emits for a parasite.
pub const POSITIVE_LABEL: i32 = 0;

/// Externally trained model mapping feature vectors to labels
pub trait Classifier: Send + Sync {
    /// Predict one label per vector; `POSITIVE_LABEL` marks a parasite
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<i32>>;
}

/// Trait for global threshold estimation on a single channel
pub trait ThresholdEstimator: Send + Sync {
    /// Estimate a threshold in the channel's value range
    fn estimate(&self, channel: &GrayImage) -> f64;
}

/// Three-way color partition of a crop
#[derive(Debug, Clone)]
pub struct Partition {
    /// Darkest cluster
    pub nucleus: GrayImage,
    pub cytoplasm: GrayImage,
    /// Brightest cluster
    pub background: GrayImage,
}

/// Trait for splitting a crop into nucleus, cytoplasm and background classes
pub trait SubStructureSegmenter: Send + Sync {
    /// `seed` makes randomised segmenters reproducible per candidate
    fn segment(&self, crop: &RgbImage, seed: u64) -> Partition;
}
