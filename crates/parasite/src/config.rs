use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::algorithms::RegionWindow;
use crate::error::{DetectError, Result};

/// Tunables of a detection run. Every field has a default, so partial
/// configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectorConfig {
    /// Border added around the image before analysis, in pixels
    pub padding: u32,
    /// Smallest component area kept by the region filter
    pub area_min: u32,
    /// Largest component area kept by the region filter
    pub area_max: u32,
    /// Most elongated component kept by the region filter (0 = circle)
    #[schemars(range(min = 0.0, max = 1.0))]
    pub max_eccentricity: f64,
    /// Half side of the square crop around each candidate
    pub crop_half_extent: u32,
    /// Independent k-means initialisations per crop
    pub restarts: usize,
    /// Lloyd iterations per initialisation
    pub max_iterations: usize,
    /// Base seed for clustering; each candidate offsets it by its index
    pub seed: u64,
    /// Process candidates on the rayon thread pool
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let window = RegionWindow::default();
        Self {
            padding: 70,
            area_min: window.area_min,
            area_max: window.area_max,
            max_eccentricity: window.max_eccentricity,
            crop_half_extent: 70,
            restarts: 20,
            max_iterations: 300,
            seed: 0,
            parallel: true,
        }
    }
}

impl DetectorConfig {
    pub fn region_window(&self) -> RegionWindow {
        RegionWindow {
            area_min: self.area_min,
            area_max: self.area_max,
            max_eccentricity: self.max_eccentricity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.area_min > self.area_max {
            return Err(DetectError::InvalidConfig(format!(
                "area_min {} exceeds area_max {}",
                self.area_min, self.area_max
            )));
        }
        if !(0.0..=1.0).contains(&self.max_eccentricity) {
            return Err(DetectError::InvalidConfig(format!(
                "max_eccentricity {} outside [0, 1]",
                self.max_eccentricity
            )));
        }
        if self.crop_half_extent == 0 {
            return Err(DetectError::InvalidConfig("crop_half_extent must be positive".into()));
        }
        if self.restarts == 0 || self.max_iterations == 0 {
            return Err(DetectError::InvalidConfig(
                "restarts and max_iterations must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.region_window(), RegionWindow::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: DetectorConfig = serde_json::from_str(r#"{ "seed": 9, "parallel": false }"#)
            .expect("valid json");
        assert_eq!(config.seed, 9);
        assert!(!config.parallel);
        assert_eq!(config.padding, 70);
    }

    #[test]
    fn test_rejects_inverted_area_window() {
        let config = DetectorConfig { area_min: 500, area_max: 100, ..Default::default() };
        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_eccentricity() {
        let config = DetectorConfig { max_eccentricity: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
    }
}
