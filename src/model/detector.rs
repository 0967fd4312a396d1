//! Model seam for threat inference. Input: [n, 32] f32 in schema order,
//! output: malicious-class probability per row.
//! With no model configured, [`NoModel`] scores everything 0.0.

use crate::features::{FeatureVector, FEATURE_COUNT};
use ndarray::Array2;

/// A trained classifier consuming feature vectors as opaque values.
pub trait ThreatModel: Send + Sync {
    /// Malicious-class probability in [0, 1].
    fn predict_proba(&self, features: &FeatureVector) -> f32;

    /// Row-wise probabilities for a `[n, 32]` matrix. The default runs
    /// `predict_proba` per row.
    fn predict_batch(&self, matrix: &Array2<f32>) -> Vec<f32> {
        matrix
            .rows()
            .into_iter()
            .map(|row| {
                let mut values = [0.0f32; FEATURE_COUNT];
                for (dst, src) in values.iter_mut().zip(row.iter()) {
                    *dst = *src;
                }
                self.predict_proba(&FeatureVector::from_array(values))
            })
            .collect()
    }

    fn name(&self) -> &str;
}

/// No-op model: inference disabled, every score is 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

impl ThreatModel for NoModel {
    fn predict_proba(&self, _features: &FeatureVector) -> f32 {
        0.0
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Stack vectors into a `[n, 32]` matrix, one row per URL.
pub fn feature_matrix(vectors: &[FeatureVector]) -> Array2<f32> {
    let mut matrix = Array2::<f32>::zeros((vectors.len(), FEATURE_COUNT));
    for (mut row, fv) in matrix.rows_mut().into_iter().zip(vectors) {
        for (dst, src) in row.iter_mut().zip(fv.to_array()) {
            *dst = src;
        }
    }
    matrix
}
