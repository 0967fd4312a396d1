//! Feature extraction pipeline: url → parts → (lexical, entropy, signatures) → vector.

use super::entropy::shannon_entropy;
use super::lexical::LexicalStats;
use super::signatures::{RuleTable, ScanInput, SignatureCounts, SignatureRules};
use super::url_parts::UrlParts;
use super::FeatureVector;
use crate::config::RulesConfig;
use crate::error::{EngineError, Result};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static DEFAULT_EXTRACTOR: OnceLock<FeatureExtractor> = OnceLock::new();

fn default_extractor() -> &'static FeatureExtractor {
    DEFAULT_EXTRACTOR.get_or_init(|| FeatureExtractor::builtin().expect("built-in signature rules"))
}

/// Stateless extractor over an immutable rule set. Cheap to clone and safe
/// to share across threads.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    rules: Arc<SignatureRules>,
}

impl FeatureExtractor {
    pub fn new(rules: Arc<SignatureRules>) -> Self {
        Self { rules }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Arc::new(SignatureRules::builtin()?)))
    }

    /// Built-in tables, or the configured rule file. Errors here are fatal
    /// startup errors.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let table = match &config.custom_rules_path {
            Some(path) => {
                let table = RuleTable::from_json_file(path)?;
                info!(path = %path.display(), version = %table.version, "loaded signature rule table");
                table
            }
            None => RuleTable::default(),
        };
        Ok(Self::new(Arc::new(SignatureRules::compile(&table)?)))
    }

    pub fn rules(&self) -> &SignatureRules {
        &self.rules
    }

    /// Extract the 32-slot vector. Never fails: degenerate input yields zeros.
    pub fn extract(&self, url: &str) -> FeatureVector {
        let parts = UrlParts::parse(url);
        let lexical = LexicalStats::from_url(url, &parts);
        let signatures = self.rules.scan(&ScanInput::new(url, &parts));
        let fv = assemble(
            &lexical,
            &signatures,
            Entropies {
                query: shannon_entropy(parts.query),
                path: shannon_entropy(parts.path),
                url: shannon_entropy(url),
            },
        );
        debug!(url_length = lexical.url_length, tokens = lexical.token_count, "features extracted");
        fv
    }

    /// Extract from raw bytes. Absent input is an error; bytes that are not
    /// UTF-8 are read lossily.
    pub fn extract_bytes(&self, input: Option<&[u8]>) -> Result<FeatureVector> {
        let bytes = input.ok_or_else(|| EngineError::InvalidInput("url is absent".to_string()))?;
        Ok(self.extract(&String::from_utf8_lossy(bytes)))
    }
}

struct Entropies {
    query: f32,
    path: f32,
    url: f32,
}

fn assemble(lexical: &LexicalStats, sig: &SignatureCounts, entropy: Entropies) -> FeatureVector {
    FeatureVector {
        token_count: lexical.token_count as f32,
        token_length_sum: lexical.token_length_sum as f32,
        avg_token_length: lexical.avg_token_length,
        max_token_length: lexical.max_token_length as f32,
        url_length: lexical.url_length as f32,
        special_chars: lexical.special_chars as f32,
        encoded_chars: lexical.encoded_chars as f32,
        numeric_chars: lexical.numeric_chars as f32,
        query_length: lexical.query_length as f32,
        sql_keyword_count: sig.sql_keyword_count as f32,
        sql_operator_count: sig.sql_operator_count as f32,
        sql_function_count: sig.sql_function_count as f32,
        sql_comment_pattern: sig.sql_comment_pattern as f32,
        sql_quote_pattern: sig.sql_quote_pattern as f32,
        sql_equals_pattern: sig.sql_equals_pattern as f32,
        sql_union_pattern: sig.sql_union_pattern as f32,
        sql_or_injection: sig.sql_or_injection as f32,
        xss_keyword_count: sig.xss_keyword_count as f32,
        xss_tag_count: sig.xss_tag_count as f32,
        xss_event_handler: sig.xss_event_handler as f32,
        xss_js_protocol: sig.xss_js_protocol as f32,
        xss_encoded_script: sig.xss_encoded_script as f32,
        xss_html_entities: sig.xss_html_entities as f32,
        query_entropy: entropy.query,
        path_entropy: entropy.path,
        url_entropy: entropy.url,
        param_count: lexical.param_count as f32,
        avg_param_length: lexical.avg_param_length,
        suspicious_param_chars: lexical.suspicious_param_chars as f32,
        directory_traversal: sig.directory_traversal as f32,
        file_inclusion: sig.file_inclusion as f32,
        command_injection: sig.command_injection as f32,
    }
}

/// Extract features with the built-in rule tables.
pub fn extract_features(url: &str) -> Result<FeatureVector> {
    Ok(default_extractor().extract(url))
}

/// Byte-level variant of [`extract_features`]; `None` is an input error.
pub fn extract_features_bytes(input: Option<&[u8]>) -> Result<FeatureVector> {
    default_extractor().extract_bytes(input)
}
