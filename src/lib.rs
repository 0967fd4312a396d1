//! urlsig: URL threat-signal engine.
//!
//! Modular structure:
//! - [`features`]: 32-slot lexical, entropy and attack-signature feature vectors
//! - [`traffic`]: Rule-based traffic categorization
//! - [`model`]: Inference boundary for a trained classifier
//! - [`risk`]: Verdicts (status, confidence, risk score) from model output
//! - [`batch`]: Parallel, order-preserving scanning
//! - [`report`]: Scan records and batch summaries
//! - [`logging`]: Structured JSON logging

pub mod batch;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod report;
pub mod risk;
pub mod traffic;

pub use batch::BatchScanner;
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use features::{extract_features, extract_features_bytes, FeatureExtractor, FeatureVector};
pub use logging::StructuredLogger;
pub use model::{NoModel, ThreatModel};
pub use report::{BatchSummary, EvaluationReport, ScanRecord};
pub use risk::{RiskEngine, ThreatStatus, Verdict};
pub use traffic::{classify_traffic, TrafficCategory};
