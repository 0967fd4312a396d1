//! URL feature extraction: tokens, entropy, lexical statistics and attack
//! signatures assembled into a fixed 32-slot vector.

pub mod entropy;
pub mod lexical;
mod pipeline;
pub mod signatures;
pub mod tokenizer;
pub mod url_parts;

pub use entropy::shannon_entropy;
pub use lexical::LexicalStats;
pub use pipeline::{extract_features, extract_features_bytes, FeatureExtractor};
pub use signatures::{RuleTable, SignatureCounts, SignatureRules, RULES_VERSION};
pub use tokenizer::{tokenize, Tokens};
pub use url_parts::UrlParts;

use serde::{Deserialize, Serialize};

/// Number of slots in the published feature schema.
pub const FEATURE_COUNT: usize = 32;

/// Slot names in schema order. Model compatibility depends on this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Token_Count",
    "Token_Length_Sum",
    "Avg_Token_Length",
    "Max_Token_Length",
    "URL_Length",
    "Special_Chars",
    "Encoded_Chars",
    "Numeric_Chars",
    "Query_Length",
    "SQL_Keyword_Count",
    "SQL_Operator_Count",
    "SQL_Function_Count",
    "SQL_Comment_Pattern",
    "SQL_Quote_Pattern",
    "SQL_Equals_Pattern",
    "SQL_Union_Pattern",
    "SQL_OR_Injection",
    "XSS_Keyword_Count",
    "XSS_Tag_Count",
    "XSS_Event_Handler",
    "XSS_JS_Protocol",
    "XSS_Encoded_Script",
    "XSS_HTML_Entities",
    "Query_Entropy",
    "Path_Entropy",
    "URL_Entropy",
    "Param_Count",
    "Avg_Param_Length",
    "Suspicious_Param_Chars",
    "Directory_Traversal",
    "File_Inclusion",
    "Command_Injection",
];

/// One value per schema slot. Serialized with the schema names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    #[serde(rename = "Token_Count")]
    pub token_count: f32,
    #[serde(rename = "Token_Length_Sum")]
    pub token_length_sum: f32,
    #[serde(rename = "Avg_Token_Length")]
    pub avg_token_length: f32,
    #[serde(rename = "Max_Token_Length")]
    pub max_token_length: f32,
    #[serde(rename = "URL_Length")]
    pub url_length: f32,
    #[serde(rename = "Special_Chars")]
    pub special_chars: f32,
    #[serde(rename = "Encoded_Chars")]
    pub encoded_chars: f32,
    #[serde(rename = "Numeric_Chars")]
    pub numeric_chars: f32,
    #[serde(rename = "Query_Length")]
    pub query_length: f32,
    #[serde(rename = "SQL_Keyword_Count")]
    pub sql_keyword_count: f32,
    #[serde(rename = "SQL_Operator_Count")]
    pub sql_operator_count: f32,
    #[serde(rename = "SQL_Function_Count")]
    pub sql_function_count: f32,
    #[serde(rename = "SQL_Comment_Pattern")]
    pub sql_comment_pattern: f32,
    #[serde(rename = "SQL_Quote_Pattern")]
    pub sql_quote_pattern: f32,
    #[serde(rename = "SQL_Equals_Pattern")]
    pub sql_equals_pattern: f32,
    #[serde(rename = "SQL_Union_Pattern")]
    pub sql_union_pattern: f32,
    #[serde(rename = "SQL_OR_Injection")]
    pub sql_or_injection: f32,
    #[serde(rename = "XSS_Keyword_Count")]
    pub xss_keyword_count: f32,
    #[serde(rename = "XSS_Tag_Count")]
    pub xss_tag_count: f32,
    #[serde(rename = "XSS_Event_Handler")]
    pub xss_event_handler: f32,
    #[serde(rename = "XSS_JS_Protocol")]
    pub xss_js_protocol: f32,
    #[serde(rename = "XSS_Encoded_Script")]
    pub xss_encoded_script: f32,
    #[serde(rename = "XSS_HTML_Entities")]
    pub xss_html_entities: f32,
    #[serde(rename = "Query_Entropy")]
    pub query_entropy: f32,
    #[serde(rename = "Path_Entropy")]
    pub path_entropy: f32,
    #[serde(rename = "URL_Entropy")]
    pub url_entropy: f32,
    #[serde(rename = "Param_Count")]
    pub param_count: f32,
    #[serde(rename = "Avg_Param_Length")]
    pub avg_param_length: f32,
    #[serde(rename = "Suspicious_Param_Chars")]
    pub suspicious_param_chars: f32,
    #[serde(rename = "Directory_Traversal")]
    pub directory_traversal: f32,
    #[serde(rename = "File_Inclusion")]
    pub file_inclusion: f32,
    #[serde(rename = "Command_Injection")]
    pub command_injection: f32,
}

impl FeatureVector {
    /// Values in schema order, as fed to a model.
    pub fn to_array(&self) -> [f32; FEATURE_COUNT] {
        [
            self.token_count,
            self.token_length_sum,
            self.avg_token_length,
            self.max_token_length,
            self.url_length,
            self.special_chars,
            self.encoded_chars,
            self.numeric_chars,
            self.query_length,
            self.sql_keyword_count,
            self.sql_operator_count,
            self.sql_function_count,
            self.sql_comment_pattern,
            self.sql_quote_pattern,
            self.sql_equals_pattern,
            self.sql_union_pattern,
            self.sql_or_injection,
            self.xss_keyword_count,
            self.xss_tag_count,
            self.xss_event_handler,
            self.xss_js_protocol,
            self.xss_encoded_script,
            self.xss_html_entities,
            self.query_entropy,
            self.path_entropy,
            self.url_entropy,
            self.param_count,
            self.avg_param_length,
            self.suspicious_param_chars,
            self.directory_traversal,
            self.file_inclusion,
            self.command_injection,
        ]
    }

    /// Inverse of [`FeatureVector::to_array`].
    pub fn from_array(v: [f32; FEATURE_COUNT]) -> Self {
        Self {
            token_count: v[0],
            token_length_sum: v[1],
            avg_token_length: v[2],
            max_token_length: v[3],
            url_length: v[4],
            special_chars: v[5],
            encoded_chars: v[6],
            numeric_chars: v[7],
            query_length: v[8],
            sql_keyword_count: v[9],
            sql_operator_count: v[10],
            sql_function_count: v[11],
            sql_comment_pattern: v[12],
            sql_quote_pattern: v[13],
            sql_equals_pattern: v[14],
            sql_union_pattern: v[15],
            sql_or_injection: v[16],
            xss_keyword_count: v[17],
            xss_tag_count: v[18],
            xss_event_handler: v[19],
            xss_js_protocol: v[20],
            xss_encoded_script: v[21],
            xss_html_entities: v[22],
            query_entropy: v[23],
            path_entropy: v[24],
            url_entropy: v[25],
            param_count: v[26],
            avg_param_length: v[27],
            suspicious_param_chars: v[28],
            directory_traversal: v[29],
            file_inclusion: v[30],
            command_injection: v[31],
        }
    }

    /// `(name, value)` pairs in schema order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f32)> {
        FEATURE_NAMES.into_iter().zip(self.to_array())
    }

    pub fn get(&self, name: &str) -> Option<f32> {
        self.named().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}
