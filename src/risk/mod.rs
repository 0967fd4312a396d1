//! Verdicts from model probabilities.

mod engine;

pub use engine::{RiskEngine, RiskLevel, ThreatStatus, Verdict};
