//! Lenient URL splitting and one-round percent decoding.
//!
//! Input is never assumed to be a valid URL: every split falls back to an
//! empty slice instead of failing.

use std::borrow::Cow;

/// Borrowed components of a raw URL string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlParts<'a> {
    pub scheme: &'a str,
    /// Authority without the `//` prefix (may carry userinfo and port)
    pub authority: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub fragment: &'a str,
}

impl<'a> UrlParts<'a> {
    pub fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((r, f)) => (r, f),
            None => (url, ""),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, q),
            None => (rest, ""),
        };

        let (scheme, rest) = split_scheme(rest);
        let (authority, path) = match rest.strip_prefix("//") {
            Some(after) => {
                let end = after.find('/').unwrap_or(after.len());
                after.split_at(end)
            }
            None => ("", rest),
        };

        Self {
            scheme,
            authority,
            path,
            query,
            fragment,
        }
    }

    /// Lower-cased host: authority minus userinfo and port.
    pub fn host(&self) -> String {
        let host = self
            .authority
            .rsplit_once('@')
            .map_or(self.authority, |(_, h)| h);
        let host = if host.starts_with('[') {
            // IPv6 literal keeps its colons
            host.find(']').map_or(host, |i| &host[..=i])
        } else {
            host.split(':').next().unwrap_or(host)
        };
        host.to_lowercase()
    }

    pub fn has_userinfo(&self) -> bool {
        self.authority.contains('@')
    }

    /// `key=value` pairs of the query string. Pieces without `=` or with an
    /// empty key are not parameters.
    pub fn params(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.query
            .split('&')
            .filter_map(|piece| piece.split_once('='))
            .filter(|(key, _)| !key.is_empty())
    }
}

/// `scheme:` prefix per RFC 3986 (alpha, then alnum / `+` / `-` / `.`).
fn split_scheme(s: &str) -> (&str, &str) {
    if let Some(idx) = s.find("://") {
        let candidate = &s[..idx];
        let mut chars = candidate.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if valid {
            return (candidate, &s[idx + 1..]);
        }
    }
    ("", s)
}

/// One round of form decoding: `+` becomes a space, valid `%XX` sequences
/// are decoded, anything else (truncated escapes, invalid UTF-8) stays literal.
pub fn percent_decode_once(s: &str) -> Cow<'_, str> {
    if !s.contains(|c: char| c == '%' || c == '+') {
        return Cow::Borrowed(s);
    }
    let plus_as_space = s.replace('+', " ");
    let bytes = urlencoding::decode_binary(plus_as_space.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
}

/// Number of well-formed `%XX` escape sequences.
pub fn count_percent_encoded(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i + 2 < bytes.len() {
        if bytes[i] == b'%' && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit() {
            count += 1;
            i += 3;
        } else {
            i += 1;
        }
    }
    count
}
