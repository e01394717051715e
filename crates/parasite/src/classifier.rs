use std::sync::Arc;

use crate::error::{DetectError, Result};
use crate::traits::{Classifier, POSITIVE_LABEL};
use crate::types::FeatureVector;

/// Shape-checking pass-through around an injected [`Classifier`].
///
/// Never retrains or calibrates. An empty batch returns no labels without
/// touching the model.
#[derive(Clone)]
pub struct ClassifierAdapter {
    model: Arc<dyn Classifier>,
}

impl ClassifierAdapter {
    pub fn new(model: Arc<dyn Classifier>) -> Self {
        Self { model }
    }

    /// One flag per vector, `true` for a positive (parasite) label.
    pub fn classify(&self, batch: &[FeatureVector]) -> Result<Vec<bool>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let labels = self.model.predict(batch)?;
        if labels.len() != batch.len() {
            return Err(DetectError::LabelCount {
                expected: batch.len(),
                actual: labels.len(),
            });
        }
        Ok(labels.into_iter().map(|label| label == POSITIVE_LABEL).collect())
    }

    /// As [`classify`](Self::classify), for untyped rows; any row that is not
    /// exactly 96 values long rejects the whole batch.
    pub fn classify_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<bool>> {
        let batch = rows
            .iter()
            .map(|row| FeatureVector::try_from(row.as_slice()))
            .collect::<Result<Vec<_>>>()?;
        self.classify(&batch)
    }
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter").finish_non_exhaustive()
    }
}
