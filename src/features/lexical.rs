//! Lexical statistics over a raw URL: tokens, character classes, query parameters.

use super::tokenizer::tokenize;
use super::url_parts::{count_percent_encoded, percent_decode_once, UrlParts};
use serde::{Deserialize, Serialize};

/// Delimiters consumed by URL splitting; not counted as special characters.
pub const STRUCTURAL_CHARS: &[char] = &['/', '?', '&', '=', '.', ':', '#'];

/// Punctuation accepted in a normal (decoded) query value besides alphanumerics.
pub const PARAM_VALUE_ALLOWED: &[char] = &[' ', '-', '_', '.', '~', '+', ',', '@', ':', '/'];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexicalStats {
    /// Tokens: count and length (in characters)
    pub token_count: u32,
    pub token_length_sum: u32,
    pub avg_token_length: f32,
    pub max_token_length: u32,
    /// Whole-URL character classes
    pub url_length: u32,
    pub special_chars: u32,
    pub encoded_chars: u32,
    pub numeric_chars: u32,
    /// Query string shape
    pub query_length: u32,
    pub param_count: u32,
    pub avg_param_length: f32,
    pub suspicious_param_chars: u32,
}

impl LexicalStats {
    pub fn from_url(url: &str, parts: &UrlParts<'_>) -> Self {
        let mut s = LexicalStats::default();

        for token in tokenize(url) {
            let len = token.chars().count() as u32;
            s.token_count += 1;
            s.token_length_sum += len;
            s.max_token_length = s.max_token_length.max(len);
        }
        s.avg_token_length = ratio(s.token_length_sum, s.token_count);

        for c in url.chars() {
            s.url_length += 1;
            if c.is_ascii_digit() {
                s.numeric_chars += 1;
            } else if !c.is_alphanumeric() && !STRUCTURAL_CHARS.contains(&c) {
                s.special_chars += 1;
            }
        }
        s.encoded_chars = count_percent_encoded(url) as u32;
        s.query_length = parts.query.chars().count() as u32;

        let mut value_len_sum = 0u32;
        for (_, value) in parts.params() {
            s.param_count += 1;
            value_len_sum += value.chars().count() as u32;
            s.suspicious_param_chars += percent_decode_once(value)
                .chars()
                .filter(|c| !is_normal_value_char(*c))
                .count() as u32;
        }
        s.avg_param_length = ratio(value_len_sum, s.param_count);
        s
    }
}

fn is_normal_value_char(c: char) -> bool {
    c.is_alphanumeric() || PARAM_VALUE_ALLOWED.contains(&c)
}

/// Mean with a zero denominator defined as 0.
fn ratio(sum: u32, count: u32) -> f32 {
    if count == 0 {
        0.0
    } else {
        sum as f32 / count as f32
    }
}
