use std::sync::Arc;

use crate::{
    algorithms::{KMeansSegmenter, MeanSplitThreshold},
    classifier::ClassifierAdapter,
    config::DetectorConfig,
    error::Result,
    pipeline::Pipeline,
    traits::{Classifier, SubStructureSegmenter, ThresholdEstimator},
};

/// Builder for creating detection pipelines with a fluent API
pub struct PipelineBuilder {
    config: DetectorConfig,
    threshold_estimator: Option<Box<dyn ThresholdEstimator>>,
    segmenter: Option<Box<dyn SubStructureSegmenter>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DetectorConfig::default(),
            threshold_estimator: None,
            segmenter: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.config.padding = padding;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Run candidates one after another instead of on the thread pool
    pub fn sequential(mut self) -> Self {
        self.config.parallel = false;
        self
    }

    /// Set the threshold estimator (replaces any existing one)
    pub fn set_threshold_estimator<T>(mut self, estimator: T) -> Self
    where
        T: ThresholdEstimator + 'static,
    {
        self.threshold_estimator = Some(Box::new(estimator));
        self
    }

    /// Set the sub-structure segmenter (replaces any existing one)
    pub fn set_segmenter<S>(mut self, segmenter: S) -> Self
    where
        S: SubStructureSegmenter + 'static,
    {
        self.segmenter = Some(Box::new(segmenter));
        self
    }

    /// Validate the configuration and build around `classifier`, filling in
    /// default components where none were set.
    pub fn build(self, classifier: Arc<dyn Classifier>) -> Result<Pipeline> {
        self.config.validate()?;

        let threshold_estimator = self
            .threshold_estimator
            .unwrap_or_else(|| Box::new(MeanSplitThreshold::default()));

        let segmenter = self.segmenter.unwrap_or_else(|| {
            Box::new(KMeansSegmenter {
                restarts: self.config.restarts,
                max_iterations: self.config.max_iterations,
                ..KMeansSegmenter::default()
            })
        });

        Ok(Pipeline::new(
            self.config,
            threshold_estimator,
            segmenter,
            ClassifierAdapter::new(classifier),
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
