//! Inference boundary: the engine emits feature vectors, a model turns them
//! into a malicious-class probability.

mod detector;

pub use detector::{feature_matrix, NoModel, ThreatModel};
