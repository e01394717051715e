use strum::IntoStaticStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Feature vector has {actual} values, expected {expected}")]
    FeatureLength { expected: usize, actual: usize },

    #[error("Classifier returned {actual} labels for a batch of {expected}")]
    LabelCount { expected: usize, actual: usize },

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DetectError>;

/// Why a single candidate was dropped from the batch. Never fatal for the image.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    #[error("no cytoplasm contour in crop")]
    NoCytoplasm,

    #[error("no nucleus contour inside the cytoplasm")]
    NoNucleus,

    #[error("only one contour inside the cytoplasm, kinetoplast missing")]
    MissingKinetoplast,
}
