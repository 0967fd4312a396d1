//! Traffic categorization: a descriptive bucket per URL, independent of the
//! threat signatures.

mod classifier;

pub use classifier::{classify_traffic, TrafficClassifier};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of traffic categories. Labels are stable across versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficCategory {
    Api,
    Media,
    Mail,
    Streaming,
    Auth,
    Download,
    Suspicious,
    #[default]
    Unknown,
}

impl TrafficCategory {
    pub const ALL: [TrafficCategory; 8] = [
        TrafficCategory::Api,
        TrafficCategory::Media,
        TrafficCategory::Mail,
        TrafficCategory::Streaming,
        TrafficCategory::Auth,
        TrafficCategory::Download,
        TrafficCategory::Suspicious,
        TrafficCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficCategory::Api => "api",
            TrafficCategory::Media => "media",
            TrafficCategory::Mail => "mail",
            TrafficCategory::Streaming => "streaming",
            TrafficCategory::Auth => "auth",
            TrafficCategory::Download => "download",
            TrafficCategory::Suspicious => "suspicious",
            TrafficCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TrafficCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
