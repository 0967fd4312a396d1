//! Per-URL scan records and batch-level aggregation.

use crate::error::{EngineError, Result};
use crate::features::FeatureVector;
use crate::risk::{RiskLevel, ThreatStatus, Verdict};
use crate::traffic::TrafficCategory;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One line of scan output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: String,
    pub url: String,
    pub status: ThreatStatus,
    pub confidence: f32,
    pub traffic_type: TrafficCategory,
    pub risk_score: f32,
    pub level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(url: String, verdict: Verdict, traffic_type: TrafficCategory, features: FeatureVector) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            status: verdict.status,
            confidence: verdict.confidence,
            traffic_type,
            risk_score: verdict.risk_score,
            level: verdict.level,
            features: Some(features),
            error: None,
            scanned_at: Utc::now(),
        }
    }

    /// Record for a URL that could not be scored: status Error, zero
    /// confidence and risk, traffic `unknown`.
    pub fn failed(url: String, error: impl ToString) -> Self {
        let verdict = Verdict::error();
        Self {
            id: Uuid::new_v4().to_string(),
            url,
            status: verdict.status,
            confidence: verdict.confidence,
            traffic_type: TrafficCategory::Unknown,
            risk_score: verdict.risk_score,
            level: verdict.level,
            features: None,
            error: Some(error.to_string()),
            scanned_at: Utc::now(),
        }
    }
}

/// Totals over a set of records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub malicious: usize,
    pub safe: usize,
    pub errors: usize,
    /// malicious / total, 0 for an empty batch
    pub threat_rate: f32,
    pub by_category: BTreeMap<TrafficCategory, usize>,
    pub by_category_status: BTreeMap<TrafficCategory, BTreeMap<ThreatStatus, usize>>,
    /// Malicious records per UTC hour of `scanned_at` (0-23)
    #[serde(default)]
    pub by_hour: BTreeMap<u32, usize>,
}

impl BatchSummary {
    pub fn from_records(records: &[ScanRecord]) -> Self {
        let mut s = BatchSummary {
            total: records.len(),
            ..Default::default()
        };
        for r in records {
            match r.status {
                ThreatStatus::Malicious => s.malicious += 1,
                ThreatStatus::Safe => s.safe += 1,
                ThreatStatus::Error => s.errors += 1,
            }
            *s.by_category.entry(r.traffic_type).or_default() += 1;
            *s.by_category_status
                .entry(r.traffic_type)
                .or_default()
                .entry(r.status)
                .or_default() += 1;
            if r.status == ThreatStatus::Malicious {
                *s.by_hour.entry(r.scanned_at.hour()).or_default() += 1;
            }
        }
        if s.total > 0 {
            s.threat_rate = s.malicious as f32 / s.total as f32;
        }
        s
    }

    pub fn count(&self, category: TrafficCategory, status: ThreatStatus) -> usize {
        self.by_category_status
            .get(&category)
            .and_then(|m| m.get(&status))
            .copied()
            .unwrap_or(0)
    }
}

/// Binary confusion counts; the positive class is malicious.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    /// Rows are actual (safe, malicious), columns predicted.
    pub fn as_matrix(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negative, self.false_positive],
            [self.false_negative, self.true_positive],
        ]
    }
}

/// Model performance over labelled URLs. Rates are fractions in [0, 1];
/// any rate with a zero denominator is 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Records compared against their label
    pub evaluated: usize,
    /// Error records, left out of every metric
    pub skipped: usize,
    pub confusion: ConfusionMatrix,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    /// Area under the ROC curve of `risk_score`; 0 unless both classes are present
    pub roc_auc: f32,
}

impl EvaluationReport {
    /// `labels[i]` is true when `records[i]` is actually malicious.
    pub fn from_labeled(records: &[ScanRecord], labels: &[bool]) -> Result<Self> {
        if records.len() != labels.len() {
            return Err(EngineError::InvalidInput(format!(
                "{} records but {} labels",
                records.len(),
                labels.len()
            )));
        }

        let mut report = EvaluationReport::default();
        let mut scored = Vec::with_capacity(records.len());
        for (r, &actual) in records.iter().zip(labels) {
            let predicted = match r.status {
                ThreatStatus::Malicious => true,
                ThreatStatus::Safe => false,
                ThreatStatus::Error => {
                    report.skipped += 1;
                    continue;
                }
            };
            let c = &mut report.confusion;
            match (actual, predicted) {
                (false, false) => c.true_negative += 1,
                (false, true) => c.false_positive += 1,
                (true, false) => c.false_negative += 1,
                (true, true) => c.true_positive += 1,
            }
            scored.push((r.risk_score, actual));
        }
        report.evaluated = scored.len();

        let c = report.confusion;
        report.accuracy = ratio(c.true_positive + c.true_negative, report.evaluated);
        report.precision = ratio(c.true_positive, c.true_positive + c.false_positive);
        report.recall = ratio(c.true_positive, c.true_positive + c.false_negative);
        let pr = report.precision + report.recall;
        if pr > 0.0 {
            report.f1 = 2.0 * report.precision * report.recall / pr;
        }
        report.roc_auc = roc_auc(&mut scored);
        Ok(report)
    }
}

fn ratio(n: usize, d: usize) -> f32 {
    if d == 0 {
        0.0
    } else {
        n as f32 / d as f32
    }
}

/// Rank-sum (Mann-Whitney) AUC; tied scores share their average rank.
fn roc_auc(scored: &mut [(f32, bool)]) -> f32 {
    let positives = scored.iter().filter(|(_, actual)| *actual).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.0;
    }
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut positive_rank_sum = 0.0f64;
    let mut start = 0;
    while start < scored.len() {
        let mut end = start;
        while end < scored.len() && scored[end].0 == scored[start].0 {
            end += 1;
        }
        // ranks start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = scored[start..end].iter().filter(|(_, actual)| *actual).count();
        positive_rank_sum += avg_rank * tied_positives as f64;
        start = end;
    }

    let p = positives as f64;
    let auc = (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64);
    auc as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskEngine;
    use chrono::TimeZone;

    fn record(category: TrafficCategory, p: f32) -> ScanRecord {
        ScanRecord::new(
            "http://example.com/".to_string(),
            RiskEngine::default().assess(p),
            category,
            FeatureVector::default(),
        )
    }

    #[test]
    fn empty_summary() {
        let s = BatchSummary::from_records(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.threat_rate, 0.0);
        assert!(s.by_category.is_empty());
    }

    #[test]
    fn counts_by_status_and_category() {
        let records = vec![
            record(TrafficCategory::Api, 0.9),
            record(TrafficCategory::Api, 0.1),
            record(TrafficCategory::Media, 0.1),
            ScanRecord::failed("??".to_string(), "boom"),
        ];
        let s = BatchSummary::from_records(&records);
        assert_eq!(s.total, 4);
        assert_eq!(s.malicious, 1);
        assert_eq!(s.safe, 2);
        assert_eq!(s.errors, 1);
        assert!((s.threat_rate - 0.25).abs() < 1e-6);
        assert_eq!(s.by_category[&TrafficCategory::Api], 2);
        assert_eq!(s.count(TrafficCategory::Api, ThreatStatus::Malicious), 1);
        assert_eq!(s.count(TrafficCategory::Unknown, ThreatStatus::Error), 1);
        assert_eq!(s.count(TrafficCategory::Mail, ThreatStatus::Safe), 0);
    }

    #[test]
    fn failed_record_shape() {
        let r = ScanRecord::failed("x".to_string(), "url is absent");
        assert_eq!(r.status, ThreatStatus::Error);
        assert_eq!(r.traffic_type, TrafficCategory::Unknown);
        assert_eq!(r.confidence, 0.0);
        assert!(r.features.is_none());
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"status\":\"Error\""));
        assert!(!json.contains("\"features\""));
    }

    #[test]
    fn malicious_counts_by_hour() {
        let at = |h: u32| Utc.with_ymd_and_hms(2024, 5, 1, h, 30, 0).unwrap();
        let mut records = vec![
            record(TrafficCategory::Suspicious, 0.9),
            record(TrafficCategory::Suspicious, 0.95),
            record(TrafficCategory::Api, 0.9),
            record(TrafficCategory::Api, 0.1),
        ];
        records[0].scanned_at = at(13);
        records[1].scanned_at = at(13);
        records[2].scanned_at = at(2);
        records[3].scanned_at = at(5);
        let s = BatchSummary::from_records(&records);
        assert_eq!(s.by_hour.len(), 2);
        assert_eq!(s.by_hour[&13], 2);
        assert_eq!(s.by_hour[&2], 1);
        assert!(!s.by_hour.contains_key(&5));

        let back: BatchSummary = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn evaluation_metrics_and_confusion() {
        // predictions: M M S S M, labels: M S M S S
        let records = vec![
            record(TrafficCategory::Api, 0.9),
            record(TrafficCategory::Api, 0.8),
            record(TrafficCategory::Api, 0.3),
            record(TrafficCategory::Api, 0.1),
            record(TrafficCategory::Api, 0.6),
        ];
        let labels = [true, false, true, false, false];
        let r = EvaluationReport::from_labeled(&records, &labels).unwrap();
        assert_eq!(r.evaluated, 5);
        assert_eq!(r.confusion.as_matrix(), [[1, 2], [1, 1]]);
        assert!((r.accuracy - 0.4).abs() < 1e-6);
        assert!((r.precision - 1.0 / 3.0).abs() < 1e-6);
        assert!((r.recall - 0.5).abs() < 1e-6);
        assert!((r.f1 - 0.4).abs() < 1e-6);
        // positives 0.9, 0.3 vs negatives 0.8, 0.1, 0.6: 4 of 6 pairs ordered
        assert!((r.roc_auc - 4.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn evaluation_zero_denominators() {
        let records = vec![record(TrafficCategory::Api, 0.1), record(TrafficCategory::Api, 0.2)];
        let r = EvaluationReport::from_labeled(&records, &[false, false]).unwrap();
        assert_eq!(r.accuracy, 1.0);
        assert_eq!(r.precision, 0.0);
        assert_eq!(r.recall, 0.0);
        assert_eq!(r.f1, 0.0);
        assert_eq!(r.roc_auc, 0.0);

        let empty = EvaluationReport::from_labeled(&[], &[]).unwrap();
        assert_eq!(empty, EvaluationReport::default());
    }

    #[test]
    fn evaluation_skips_errors_and_ties_share_rank() {
        let records = vec![
            record(TrafficCategory::Api, 0.8),
            record(TrafficCategory::Api, 0.8),
            ScanRecord::failed("x".to_string(), "boom"),
        ];
        let r = EvaluationReport::from_labeled(&records, &[true, false, true]).unwrap();
        assert_eq!(r.evaluated, 2);
        assert_eq!(r.skipped, 1);
        assert!((r.roc_auc - 0.5).abs() < 1e-6);
    }

    #[test]
    fn evaluation_rejects_mismatched_labels() {
        let records = vec![record(TrafficCategory::Api, 0.1)];
        assert!(matches!(
            EvaluationReport::from_labeled(&records, &[]),
            Err(EngineError::InvalidInput(_))
        ));
    }
}
