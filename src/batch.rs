//! Scanning: features, traffic category, model score and verdict per URL.
//! Batches run on a dedicated rayon pool and keep input order.

use crate::config::{BatchConfig, EngineConfig};
use crate::error::{EngineError, Result};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::model::{feature_matrix, NoModel, ThreatModel};
use crate::report::ScanRecord;
use crate::risk::RiskEngine;
use crate::traffic::{TrafficCategory, TrafficClassifier};
use rayon::prelude::*;
use std::io::BufRead;
use std::sync::Arc;
use tracing::{debug, info};

pub struct BatchScanner {
    extractor: FeatureExtractor,
    classifier: TrafficClassifier,
    model: Arc<dyn ThreatModel>,
    risk: RiskEngine,
    pool: rayon::ThreadPool,
}

impl BatchScanner {
    pub fn new(
        extractor: FeatureExtractor,
        model: Arc<dyn ThreatModel>,
        risk: RiskEngine,
        batch: &BatchConfig,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(batch.workers)
            .thread_name(|i| format!("urlsig-scan-{i}"))
            .build()
            .map_err(|e| EngineError::Config(format!("batch pool: {e}")))?;
        info!(workers = pool.current_num_threads(), model = model.name(), "scanner ready");
        Ok(Self {
            extractor,
            classifier: TrafficClassifier::new(),
            model,
            risk,
            pool,
        })
    }

    /// Scanner with rules from config and no model attached.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(
            FeatureExtractor::from_config(&config.rules)?,
            Arc::new(NoModel),
            RiskEngine::new(config.risk.clone()),
            &config.batch,
        )
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn scan(&self, url: &str) -> ScanRecord {
        let features = self.extractor.extract(url);
        let traffic = self.classifier.classify(url);
        let p = self.model.predict_proba(&features);
        self.record(url, features, traffic, p)
    }

    /// Absent input yields an Error record instead of failing.
    pub fn scan_bytes(&self, input: Option<&[u8]>) -> ScanRecord {
        match input {
            Some(bytes) => self.scan(&String::from_utf8_lossy(bytes)),
            None => ScanRecord::failed(String::new(), EngineError::InvalidInput("url is absent".to_string())),
        }
    }

    /// One record per URL, in input order. Features are computed in
    /// parallel, then the model scores the whole `[n, 32]` matrix at once.
    pub fn scan_batch<S: AsRef<str> + Sync>(&self, urls: &[S]) -> Vec<ScanRecord> {
        let analyzed: Vec<(FeatureVector, TrafficCategory)> = self.pool.install(|| {
            urls.par_iter()
                .map(|u| {
                    let u = u.as_ref();
                    (self.extractor.extract(u), self.classifier.classify(u))
                })
                .collect()
        });
        let vectors: Vec<FeatureVector> = analyzed.iter().map(|(fv, _)| *fv).collect();
        let probabilities = self.model.predict_batch(&feature_matrix(&vectors));
        debug!(urls = urls.len(), scores = probabilities.len(), "batch scored");

        urls.iter()
            .zip(analyzed)
            .enumerate()
            .map(|(i, (url, (features, traffic)))| match probabilities.get(i) {
                Some(&p) => self.record(url.as_ref(), features, traffic, p),
                None => ScanRecord::failed(url.as_ref().to_string(), format!("model returned no score for row {i}")),
            })
            .collect()
    }

    /// Byte-level batch; absent items become Error records in place.
    pub fn scan_batch_bytes(&self, inputs: &[Option<&[u8]>]) -> Vec<ScanRecord> {
        self.pool
            .install(|| inputs.par_iter().map(|input| self.scan_bytes(*input)).collect())
    }

    fn record(&self, url: &str, features: FeatureVector, traffic: TrafficCategory, p: f32) -> ScanRecord {
        ScanRecord::new(url.to_string(), self.risk.assess(p), traffic, features)
    }
}

/// URLs from a line-oriented reader: one per line, trimmed, blank lines
/// skipped. Lines that are not UTF-8 are decoded lossily, never rejected.
pub fn read_url_lines<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        let text = String::from_utf8_lossy(&line);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            urls.push(trimmed.to_string());
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::ThreatStatus;

    /// Flags anything carrying SQL keywords.
    struct KeywordModel;

    impl ThreatModel for KeywordModel {
        fn predict_proba(&self, features: &FeatureVector) -> f32 {
            if features.sql_keyword_count > 0.0 {
                0.9
            } else {
                0.1
            }
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    /// Returns one score too few for any batch.
    struct ShortModel;

    impl ThreatModel for ShortModel {
        fn predict_proba(&self, _features: &FeatureVector) -> f32 {
            0.0
        }

        fn predict_batch(&self, matrix: &ndarray::Array2<f32>) -> Vec<f32> {
            vec![0.0; matrix.nrows().saturating_sub(1)]
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    fn scanner(model: Arc<dyn ThreatModel>) -> BatchScanner {
        BatchScanner::new(
            FeatureExtractor::builtin().unwrap(),
            model,
            RiskEngine::default(),
            &BatchConfig { workers: 2 },
        )
        .unwrap()
    }

    #[test]
    fn no_model_scans_safe() {
        let r = scanner(Arc::new(NoModel)).scan("https://cdn.example.com/image.jpg");
        assert_eq!(r.status, ThreatStatus::Safe);
        assert_eq!(r.traffic_type, TrafficCategory::Media);
        assert_eq!(r.confidence, 1.0);
        assert!(r.features.is_some());
    }

    #[test]
    fn batch_keeps_order_and_matches_single_scans() {
        let s = scanner(Arc::new(KeywordModel));
        let urls = vec![
            "http://example.com/api/data".to_string(),
            "http://bank.com/transfer?to='; DROP TABLE users;--".to_string(),
            "https://cdn.example.com/image.jpg".to_string(),
        ];
        let batch = s.scan_batch(&urls);
        assert_eq!(batch.len(), 3);
        for (url, r) in urls.iter().zip(&batch) {
            let single = s.scan(url);
            assert_eq!(&r.url, url);
            assert_eq!(r.status, single.status);
            assert_eq!(r.traffic_type, single.traffic_type);
            assert_eq!(r.features, single.features);
        }
        assert_eq!(batch[1].status, ThreatStatus::Malicious);
        assert_eq!(batch[0].status, ThreatStatus::Safe);
    }

    #[test]
    fn missing_scores_become_error_records() {
        let batch = scanner(Arc::new(ShortModel)).scan_batch(&["http://a.com/", "http://b.com/"]);
        assert_eq!(batch[0].status, ThreatStatus::Safe);
        assert_eq!(batch[1].status, ThreatStatus::Error);
        assert_eq!(batch[1].url, "http://b.com/");
    }

    #[test]
    fn absent_bytes_do_not_abort_batch() {
        let s = scanner(Arc::new(NoModel));
        let records = s.scan_batch_bytes(&[Some(b"http://example.com/".as_slice()), None, Some(&[0xff, 0xfe][..])]);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].status, ThreatStatus::Safe);
        assert_eq!(records[1].status, ThreatStatus::Error);
        assert_eq!(records[1].traffic_type, TrafficCategory::Unknown);
        assert_eq!(records[2].status, ThreatStatus::Safe);
    }

    #[test]
    fn empty_batch() {
        assert!(scanner(Arc::new(NoModel)).scan_batch::<String>(&[]).is_empty());
    }

    #[test]
    fn invalid_utf8_line_is_still_scanned() {
        let input: &[u8] = b"http://example.com/\r\n\nhttp://x.com/\xff\xfe\n  https://cdn.example.com/a.jpg  \n";
        let urls = read_url_lines(input).unwrap();
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0], "http://example.com/");
        assert_eq!(urls[1], "http://x.com/\u{fffd}\u{fffd}");
        assert_eq!(urls[2], "https://cdn.example.com/a.jpg");

        let records = scanner(Arc::new(NoModel)).scan_batch(&urls);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.status == ThreatStatus::Safe));
        assert_eq!(records[2].traffic_type, TrafficCategory::Media);
    }

    #[test]
    fn no_trailing_newline_and_empty_input() {
        assert_eq!(read_url_lines(&b"a\nb"[..]).unwrap(), ["a", "b"]);
        assert!(read_url_lines(&b""[..]).unwrap().is_empty());
        assert!(read_url_lines(&b"\n \n\t\n"[..]).unwrap().is_empty());
    }
}
