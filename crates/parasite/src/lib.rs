//! # Parasite Detection Library
//!
//! Locates candidate parasites in stained microscopy images and classifies
//! each one with an externally trained model, returning bounding boxes.
//!
//! ## Stages
//!
//! - **Border padding**: extend the image with edge-mean strips
//! - **Thresholding**: one-shot mean-of-means threshold on the red channel
//! - **Region filtering**: keep components inside an area/eccentricity window
//! - **Localization**: fixed-size crops around region centroids
//! - **Sub-structure segmentation**: k-means into nucleus, cytoplasm, background
//! - **Feature extraction**: 96 morphological, texture and color values
//! - **Classification**: injected [`Classifier`], label `0` is a parasite
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parasite::{Classifier, FeatureVector, Pipeline};
//!
//! struct AlwaysPositive;
//!
//! impl Classifier for AlwaysPositive {
//!     fn predict(&self, batch: &[FeatureVector]) -> parasite::Result<Vec<i32>> {
//!         Ok(vec![0; batch.len()])
//!     }
//! }
//!
//! let pipeline = Pipeline::builder().build(Arc::new(AlwaysPositive))?;
//! let analysis = pipeline.analyze_path("sample.jpg")?;
//! println!("{}", analysis.to_json()?);
//! analysis.save_annotated("sample_annotated.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod traits;
pub mod config;
pub mod algorithms;
pub mod features;
pub mod classifier;
pub mod annotate;
pub mod pipeline;

// Re-exports for convenience
pub use error::{DetectError, Result, SkipReason};
pub use types::{
    Candidate, Centroid, Detection, FeatureVector, Report, SubMasks, SubStructure, DETECTION_SIZE,
    ELEMENT_NAME, FEATURE_LEN,
};
pub use traits::*;
pub use config::DetectorConfig;
pub use classifier::ClassifierAdapter;
pub use pipeline::{Analysis, Pipeline, builder::PipelineBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_filled_circle_mut;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BACKGROUND: Rgb<u8> = Rgb([230, 220, 235]);
    const CYTOPLASM: Rgb<u8> = Rgb([150, 120, 170]);
    const STAIN: Rgb<u8> = Rgb([50, 20, 90]);

    /// Positive whenever the nucleus is small; counts its calls.
    #[derive(Default)]
    struct SmallNucleusModel {
        calls: AtomicUsize,
    }

    impl Classifier for SmallNucleusModel {
        fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<i32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(batch
                .iter()
                .map(|v| if v.substructure(SubStructure::Nucleus)[0] < 1000.0 { 0 } else { 1 })
                .collect())
        }
    }

    /// A stained cell: cytoplasm disc, nucleus, and optionally a kinetoplast.
    fn create_cell_image(with_kinetoplast: bool) -> RgbImage {
        let mut img = RgbImage::from_pixel(200, 200, BACKGROUND);
        draw_filled_circle_mut(&mut img, (100, 100), 40, CYTOPLASM);
        draw_filled_circle_mut(&mut img, (100, 100), 10, STAIN);
        if with_kinetoplast {
            draw_filled_circle_mut(&mut img, (122, 100), 4, STAIN);
        }
        img
    }

    #[test]
    fn test_single_cell_is_detected() {
        let model = Arc::new(SmallNucleusModel::default());
        let pipeline = Pipeline::builder().build(model.clone()).expect("valid config");

        let analysis = pipeline.analyze(&create_cell_image(true)).expect("analysis runs");

        assert_eq!(analysis.candidates, 1);
        assert!(analysis.skipped.is_empty(), "skipped: {:?}", analysis.skipped);
        // blob centre (100, 100) is (170, 170) after padding
        assert_eq!(analysis.detections, vec![Detection { x: 100, y: 100, w: 70, h: 70 }]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_uniform_image_has_no_detections() {
        let model = Arc::new(SmallNucleusModel::default());
        let pipeline = Pipeline::builder().build(model.clone()).expect("valid config");

        let analysis = pipeline
            .analyze(&RgbImage::from_pixel(120, 90, Rgb([200, 200, 200])))
            .expect("analysis runs");

        assert!(analysis.detections.is_empty());
        assert_eq!(analysis.candidates, 0);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0, "empty batch must not reach the model");
    }

    #[test]
    fn test_missing_kinetoplast_is_skipped() {
        let model = Arc::new(SmallNucleusModel::default());
        let pipeline = Pipeline::builder().build(model.clone()).expect("valid config");

        let analysis = pipeline.analyze(&create_cell_image(false)).expect("analysis runs");

        assert_eq!(analysis.candidates, 1);
        assert_eq!(analysis.skipped, vec![(0, SkipReason::MissingKinetoplast)]);
        assert!(analysis.detections.is_empty());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let model: Arc<dyn Classifier> = Arc::new(SmallNucleusModel::default());
        let image = create_cell_image(true);

        let parallel = Pipeline::builder().build(model.clone()).expect("valid config");
        let sequential = Pipeline::builder().sequential().build(model).expect("valid config");

        assert_eq!(
            parallel.analyze(&image).expect("runs").detections,
            sequential.analyze(&image).expect("runs").detections
        );
    }

    #[test]
    fn test_report_and_annotation() {
        let pipeline = Pipeline::builder()
            .build(Arc::new(SmallNucleusModel::default()))
            .expect("valid config");
        let analysis = pipeline.analyze(&create_cell_image(true)).expect("analysis runs");

        let report = analysis.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report[ELEMENT_NAME].len(), 1);

        let json: serde_json::Value =
            serde_json::from_str(&analysis.to_json().expect("serializes")).expect("valid json");
        assert_eq!(json["parasite"][0]["w"], 70);
        assert_eq!(json["parasite"][0]["x"], 100);

        let annotated = analysis.annotated();
        assert_eq!(annotated.dimensions(), (340, 340));
        assert_eq!(*annotated.get_pixel(99, 170), Rgb([0, 255, 0]));
        assert_eq!(*annotated.get_pixel(100, 170), Rgb([0, 255, 0]));
        assert_eq!(*annotated.get_pixel(240, 170), Rgb([0, 255, 0]));
        // padded image itself is left untouched
        assert_ne!(*analysis.padded.get_pixel(100, 170), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DetectorConfig { restarts: 0, ..Default::default() };
        let result = Pipeline::builder()
            .with_config(config)
            .build(Arc::new(SmallNucleusModel::default()));
        assert!(matches!(result, Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn test_undecodable_path_is_fatal() {
        let pipeline = Pipeline::builder()
            .build(Arc::new(SmallNucleusModel::default()))
            .expect("valid config");
        let err = pipeline.analyze_path("/nonexistent/sample.png").unwrap_err();
        assert!(matches!(err, DetectError::ImageLoad(_)));
    }

    #[test]
    fn test_custom_threshold_estimator() {
        struct Fixed(f64);
        impl ThresholdEstimator for Fixed {
            fn estimate(&self, _channel: &image::GrayImage) -> f64 {
                self.0
            }
        }

        // a threshold below every pixel leaves nothing to analyze
        let model = Arc::new(SmallNucleusModel::default());
        let pipeline = Pipeline::builder()
            .set_threshold_estimator(Fixed(10.0))
            .build(model.clone())
            .expect("valid config");
        let analysis = pipeline.analyze(&create_cell_image(true)).expect("analysis runs");
        assert_eq!(analysis.candidates, 0);

        let mask = image::GrayImage::from_pixel(2, 2, Luma([0]));
        assert_eq!(Fixed(3.0).estimate(&mask), 3.0);
    }
}
