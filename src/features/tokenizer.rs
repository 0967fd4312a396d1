//! Lexical tokenizer: splits a URL on structural delimiters into borrowed tokens.

/// Punctuation that separates URL tokens, in addition to whitespace.
pub const TOKEN_DELIMITERS: &[char] = &['/', '?', '&', '=', '.', ':', ';', ',', '#', '+', '-', '_'];

#[inline]
pub fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || TOKEN_DELIMITERS.contains(&c)
}

/// Lazy token sequence over a URL. Cloning restarts from the clone point.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let start = self.rest.find(|c: char| !is_delimiter(c))?;
        let tail = &self.rest[start..];
        let end = tail.find(is_delimiter).unwrap_or(tail.len());
        let (token, rest) = tail.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

pub fn tokenize(url: &str) -> Tokens<'_> {
    Tokens { rest: url }
}
