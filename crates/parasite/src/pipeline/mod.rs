pub mod builder;

use std::path::Path;

use image::RgbImage;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{
    algorithms::{
        binarize_inverted, channel, filter_regions, locate_candidates, locate_organelles,
        pad_image, Located,
    },
    annotate::draw_detection_box,
    classifier::ClassifierAdapter,
    config::DetectorConfig,
    error::{Result, SkipReason},
    features::feature_vector,
    traits::{SubStructureSegmenter, ThresholdEstimator},
    types::{Candidate, Centroid, Detection, Report, SubMasks, ELEMENT_NAME},
};

/// Channel the global threshold is computed on (red).
const THRESHOLD_CHANNEL: usize = 0;

/// Outcome of one image: detections plus what is needed to draw them.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The padded image all coordinates refer to
    pub padded: RgbImage,
    pub detections: Vec<Detection>,
    /// Centroids of the positive candidates, aligned with `detections`
    pub centroids: Vec<Centroid>,
    /// Number of crops handed to sub-structure segmentation
    pub candidates: usize,
    /// Candidate index and reason for every crop left out of the batch
    pub skipped: Vec<(usize, SkipReason)>,
    half_extent: u32,
}

impl Analysis {
    /// `{"parasite": [...]}` mapping.
    pub fn report(&self) -> Report {
        Report::from([(ELEMENT_NAME.to_string(), self.detections.clone())])
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report())?)
    }

    /// Copy of the padded image with a green box around every detection.
    pub fn annotated(&self) -> RgbImage {
        let mut canvas = self.padded.clone();
        for &centroid in &self.centroids {
            draw_detection_box(&mut canvas, centroid, self.half_extent);
        }
        canvas
    }

    pub fn save_annotated<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.annotated().save(path)?;
        Ok(())
    }
}

/// The detection pipeline: padding, thresholding, region filtering,
/// per-candidate segmentation and features, then one classifier batch.
pub struct Pipeline {
    config: DetectorConfig,
    threshold_estimator: Box<dyn ThresholdEstimator>,
    segmenter: Box<dyn SubStructureSegmenter>,
    classifier: ClassifierAdapter,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        config: DetectorConfig,
        threshold_estimator: Box<dyn ThresholdEstimator>,
        segmenter: Box<dyn SubStructureSegmenter>,
        classifier: ClassifierAdapter,
    ) -> Self {
        Self {
            config,
            threshold_estimator,
            segmenter,
            classifier,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Decode the image at `path` and analyze it.
    pub fn analyze_path<P: AsRef<Path>>(&self, path: P) -> Result<Analysis> {
        let image = image::open(path)?.to_rgb8();
        self.analyze(&image)
    }

    /// Run every stage on one decoded image.
    pub fn analyze(&self, image: &RgbImage) -> Result<Analysis> {
        let config = &self.config;

        // Step 1: pad so regions near the edge still get full crops
        let padded = pad_image(image, config.padding);

        // Step 2: threshold the red channel and keep plausible regions
        let red = channel(&padded, THRESHOLD_CHANNEL);
        let threshold = self.threshold_estimator.estimate(&red);
        let binary = binarize_inverted(&red, threshold);
        let filtered = filter_regions(&binary, &config.region_window());
        debug!(threshold, "segmented red channel");

        // Step 3: crop around every surviving region
        let located = locate_candidates(&padded, &filtered, config.crop_half_extent);
        let candidates = located.len();

        // Step 4: sub-structures and features, one independent task per crop
        let outcomes: Vec<std::result::Result<Candidate, SkipReason>> = if config.parallel {
            located
                .into_par_iter()
                .enumerate()
                .map(|(index, l)| self.process_candidate(index, l))
                .collect()
        } else {
            located
                .into_iter()
                .enumerate()
                .map(|(index, l)| self.process_candidate(index, l))
                .collect()
        };

        let mut ready = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(candidate) => ready.push(candidate),
                Err(reason) => {
                    debug!(index, reason = <&'static str>::from(reason), "skipping candidate: {reason}");
                    skipped.push((index, reason));
                }
            }
        }

        // Step 5: classify the batch and keep positives
        let batch: Vec<_> = ready.iter().map(|c| c.features.clone()).collect();
        let positives = self.classifier.classify(&batch)?;

        let centroids: Vec<Centroid> = ready
            .iter()
            .zip(positives)
            .filter(|(_, positive)| *positive)
            .map(|(candidate, _)| candidate.centroid)
            .collect();
        let detections = centroids.iter().copied().map(Detection::from_centroid).collect::<Vec<_>>();

        info!(
            candidates,
            classified = ready.len(),
            skipped = skipped.len(),
            detections = detections.len(),
            "analysis finished"
        );

        Ok(Analysis {
            padded,
            detections,
            centroids,
            candidates,
            skipped,
            half_extent: config.crop_half_extent,
        })
    }

    fn process_candidate(
        &self,
        index: usize,
        located: Located,
    ) -> std::result::Result<Candidate, SkipReason> {
        let Located { centroid, crop } = located;
        let seed = self.config.seed.wrapping_add(index as u64);

        let partition = self.segmenter.segment(&crop, seed);
        if !partition.cytoplasm.pixels().any(|p| p[0] != 0) {
            return Err(SkipReason::NoCytoplasm);
        }
        let organelles = locate_organelles(&partition.nucleus, &partition.cytoplasm)?;

        let masks = SubMasks {
            nucleus: organelles.nucleus,
            kinetoplast: organelles.kinetoplast,
            cytoplasm: partition.cytoplasm,
        };
        let features = feature_vector(&crop, &masks);

        Ok(Candidate {
            index,
            centroid,
            crop,
            masks,
            features,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: padding {}, area [{}, {}], eccentricity <= {}, {}px crops, {} clustering restarts",
            self.config.padding,
            self.config.area_min,
            self.config.area_max,
            self.config.max_eccentricity,
            2 * self.config.crop_half_extent,
            self.config.restarts,
        )
    }
}
