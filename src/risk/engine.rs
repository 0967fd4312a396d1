//! Turns a malicious-class probability into a verdict: status, confidence,
//! risk score and a coarse risk level.

use crate::config::RiskConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ThreatStatus {
    Malicious,
    Safe,
    Error,
}

impl ThreatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatStatus::Malicious => "Malicious",
            ThreatStatus::Safe => "Safe",
            ThreatStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ThreatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f32, config: &RiskConfig) -> Self {
        if score >= config.high_threshold {
            RiskLevel::High
        } else if score >= config.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Outcome for a single URL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: ThreatStatus,
    /// Probability of the predicted class
    pub confidence: f32,
    /// Probability of the malicious class
    pub risk_score: f32,
    pub level: RiskLevel,
}

impl Verdict {
    /// Verdict for a URL that could not be scored.
    pub fn error() -> Self {
        Self {
            status: ThreatStatus::Error,
            confidence: 0.0,
            risk_score: 0.0,
            level: RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Out-of-range probabilities are clamped to [0, 1]; NaN scores as 0.
    pub fn assess(&self, probability: f32) -> Verdict {
        let p = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
        let status = if p >= self.config.malicious_threshold {
            ThreatStatus::Malicious
        } else {
            ThreatStatus::Safe
        };
        Verdict {
            status,
            confidence: p.max(1.0 - p),
            risk_score: p,
            level: RiskLevel::from_score(p, &self.config),
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}
