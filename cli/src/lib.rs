use parasite::{Classifier, DetectError, DetectorConfig, FeatureVector, ELEMENT_NAME, FEATURE_LEN};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("No classifier model given (use --model or 'model_path')")]
    MissingModel,
    #[error("Invalid classifier model: {0}")]
    InvalidModel(String),
}

fn default_element_name() -> String {
    ELEMENT_NAME.to_string()
}

/// Configuration of an `analyze` run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AnalysisConfig {
    /// Linear classifier artifact (JSON)
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Key of the detection list in the report
    #[serde(default = "default_element_name")]
    pub element_name: String,
    #[serde(default)]
    pub detector: DetectorConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            element_name: default_element_name(),
            detector: DetectorConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load AnalysisConfig from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load AnalysisConfig from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }
}

/// Linear decision function over the feature vector, with optional
/// per-feature standardisation applied first.
///
/// A non-negative decision value is label `0` (parasite), anything else `1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl LinearModel {
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        let model: LinearModel = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), CliError> {
        let check_len = |name: &str, values: &[f64]| {
            if values.len() == FEATURE_LEN {
                Ok(())
            } else {
                Err(CliError::InvalidModel(format!(
                    "'{name}' has {} values, expected {FEATURE_LEN}",
                    values.len()
                )))
            }
        };

        check_len("weights", &self.weights)?;
        if let Some(mean) = &self.mean {
            check_len("mean", mean)?;
        }
        if let Some(scale) = &self.scale {
            check_len("scale", scale)?;
            if scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
                return Err(CliError::InvalidModel("'scale' must be finite and non-zero".into()));
            }
        }
        Ok(())
    }

    pub fn decision(&self, features: &FeatureVector) -> f64 {
        let standardised = features.as_slice().iter().enumerate().map(|(i, &x)| {
            let centred = self.mean.as_ref().map_or(x, |mean| x - mean[i]);
            self.scale.as_ref().map_or(centred, |scale| centred / scale[i])
        });
        self.intercept + standardised.zip(&self.weights).map(|(x, w)| x * w).sum::<f64>()
    }
}

impl Classifier for LinearModel {
    fn predict(&self, batch: &[FeatureVector]) -> parasite::Result<Vec<i32>> {
        batch
            .iter()
            .map(|features| {
                let decision = self.decision(features);
                if decision.is_nan() {
                    return Err(DetectError::Classifier("decision value is NaN".into()));
                }
                Ok(if decision >= 0.0 { 0 } else { 1 })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_json(weights: &[f64], intercept: f64) -> String {
        serde_json::json!({ "weights": weights, "intercept": intercept }).to_string()
    }

    fn vector(value: f64) -> FeatureVector {
        FeatureVector::try_from(vec![value; FEATURE_LEN]).expect("right length")
    }

    #[test]
    fn test_toml_config_with_defaults() {
        let config = AnalysisConfig::from_toml(
            r#"
            model_path = "model.json"

            [detector]
            padding = 40
            seed = 7
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.model_path, Some(PathBuf::from("model.json")));
        assert_eq!(config.element_name, "parasite");
        assert_eq!(config.detector.padding, 40);
        assert_eq!(config.detector.seed, 7);
        assert_eq!(config.detector.area_max, DetectorConfig::default().area_max);
    }

    #[test]
    fn test_json_config() {
        let config = AnalysisConfig::from_json(r#"{"element_name": "cell", "detector": {"parallel": false}}"#)
            .expect("valid json");
        assert_eq!(config.element_name, "cell");
        assert!(config.model_path.is_none());
        assert!(!config.detector.parallel);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = AnalysisConfig::from_file("settings.yaml").unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFileFormat));
    }

    #[test]
    fn test_linear_model_labels() {
        let mut weights = vec![0.0; FEATURE_LEN];
        weights[0] = -1.0;
        let model = LinearModel::from_json(&model_json(&weights, 10.0)).expect("valid model");

        // decision = 10 - x
        let labels = model.predict(&[vector(5.0), vector(10.0), vector(15.0)]).expect("predicts");
        assert_eq!(labels, vec![0, 0, 1]);
    }

    #[test]
    fn test_standardisation_applied() {
        let model = LinearModel {
            weights: vec![1.0; FEATURE_LEN],
            intercept: 0.0,
            mean: Some(vec![2.0; FEATURE_LEN]),
            scale: Some(vec![4.0; FEATURE_LEN]),
        };
        let expected = FEATURE_LEN as f64 * (6.0 - 2.0) / 4.0;
        assert!((model.decision(&vector(6.0)) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_weight_count_rejected() {
        let err = LinearModel::from_json(&model_json(&[1.0, 2.0], 0.0)).unwrap_err();
        assert!(matches!(err, CliError::InvalidModel(_)));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let json = serde_json::json!({
            "weights": vec![1.0; FEATURE_LEN],
            "intercept": 0.0,
            "scale": vec![0.0; FEATURE_LEN],
        })
        .to_string();
        assert!(matches!(LinearModel::from_json(&json), Err(CliError::InvalidModel(_))));
    }

    #[test]
    fn test_bundled_configs_load() {
        let config = AnalysisConfig::from_toml(include_str!("../configs/analysis.toml"))
            .expect("bundled config parses");
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(
            config.model_path,
            Some(PathBuf::from("cli/configs/linear_model.json"))
        );

        // small nucleus area is a parasite, large is not
        let model = LinearModel::from_json(include_str!("../configs/linear_model.json"))
            .expect("bundled model is valid");
        assert_eq!(model.predict(&[vector(300.0), vector(2000.0)]).expect("predicts"), vec![0, 1]);
    }

    #[test]
    fn test_missing_model_file() {
        let err = LinearModel::from_file("/nonexistent/model.json").unwrap_err();
        assert!(matches!(err, CliError::IoError(_)));
    }
}
