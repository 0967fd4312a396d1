//! Rule-based traffic classifier over host, path and query shape.
//! Rules are evaluated in order; the first match wins.

use super::TrafficCategory;
use crate::features::UrlParts;
use std::net::Ipv4Addr;

/// URLs longer than this are treated as suspicious
const MAX_NORMAL_URL_LEN: usize = 2048;

/// Raw markers that do not belong in ordinary navigation URLs
const SUSPICIOUS_MARKERS: &[&str] = &[
    "<", ">", "'", "\"", "`", "../", "..\\", "%00", "%3c", "%3e", "%27", "%22",
];

const MAIL_HOST_PREFIXES: &[&str] = &["mail.", "webmail.", "smtp.", "imap.", "pop.", "pop3.", "mx.", "outlook."];
const MAIL_SEGMENTS: &[&str] = &["mail", "webmail", "inbox", "owa", "mailbox", "compose"];

const API_HOST_PREFIXES: &[&str] = &["api.", "rest.", "graphql."];
const API_SEGMENTS: &[&str] = &["api", "graphql", "rest", "rpc", "jsonrpc", "webhook", "webhooks"];
const API_EXTENSIONS: &[&str] = &["json", "xml"];

const STREAMING_HOST_PREFIXES: &[&str] = &["video.", "stream.", "streaming.", "live.", "tv.", "vod.", "radio."];
const STREAMING_SEGMENTS: &[&str] = &["stream", "streams", "live", "watch", "hls", "dash", "playlist", "broadcast"];
const STREAMING_EXTENSIONS: &[&str] = &["m3u8", "mpd", "m4s", "ts"];

const MEDIA_HOST_PREFIXES: &[&str] = &[
    "cdn.", "img.", "images.", "image.", "static.", "media.", "assets.", "photos.", "pics.",
];
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "tiff", "avif", "mp3", "wav", "ogg", "flac", "aac",
    "mp4", "mov", "avi", "mkv", "webm", "css", "js", "woff", "woff2", "ttf",
];

const AUTH_HOST_PREFIXES: &[&str] = &["login.", "auth.", "accounts.", "sso.", "id."];
const AUTH_SEGMENTS: &[&str] = &[
    "login", "signin", "sign-in", "logout", "auth", "oauth", "oauth2", "sso", "saml", "register", "signup",
];

const DOWNLOAD_HOST_PREFIXES: &[&str] = &["download.", "downloads.", "dl."];
const DOWNLOAD_SEGMENTS: &[&str] = &["download", "downloads"];
const DOWNLOAD_EXTENSIONS: &[&str] = &[
    "zip", "tar", "gz", "tgz", "bz2", "xz", "rar", "7z", "exe", "msi", "dmg", "pkg", "deb", "rpm", "apk", "iso",
];

/// Normalized view of the pieces the rules look at.
struct Shape<'a> {
    host: String,
    segments: Vec<&'a str>,
    extension: &'a str,
}

impl<'a> Shape<'a> {
    fn new(parts: &UrlParts<'_>, path: &'a str) -> Self {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut host = parts.host();
        // "example.com/x" without a scheme: the first segment is the host
        if host.is_empty() && parts.scheme.is_empty() && !path.starts_with('/') && !segments.is_empty() {
            host = segments.remove(0).to_string();
        }
        let extension = segments
            .last()
            .and_then(|last| last.rsplit_once('.'))
            .map_or("", |(_, ext)| ext);
        Self {
            host,
            segments,
            extension,
        }
    }

    fn host_starts_with(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().any(|p| self.host.starts_with(p))
    }

    fn has_segment(&self, names: &[&str]) -> bool {
        self.segments.iter().any(|s| names.contains(s))
    }

    fn first_segment_is(&self, names: &[&str]) -> bool {
        self.segments.first().is_some_and(|s| names.contains(s))
    }

    fn extension_in(&self, exts: &[&str]) -> bool {
        !self.extension.is_empty() && exts.contains(&self.extension)
    }

    fn is_ip_literal(&self) -> bool {
        self.host.parse::<Ipv4Addr>().is_ok() || self.host.starts_with('[')
    }
}

fn is_version_segment(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit())
}

/// Stateless traffic classifier over the built-in rule lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrafficClassifier;

impl TrafficClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Exactly one category per URL; malformed input falls back to `Unknown`.
    pub fn classify(&self, url: &str) -> TrafficCategory {
        let url = url.trim();
        if url.is_empty() {
            return TrafficCategory::Unknown;
        }
        let lower = url.to_lowercase();
        let parts = UrlParts::parse(&lower);
        let shape = Shape::new(&parts, parts.path);

        if lower.len() > MAX_NORMAL_URL_LEN
            || shape.is_ip_literal()
            || parts.has_userinfo()
            || SUSPICIOUS_MARKERS.iter().any(|m| lower.contains(m))
        {
            return TrafficCategory::Suspicious;
        }

        if lower.starts_with("mailto:") || shape.host_starts_with(MAIL_HOST_PREFIXES) || shape.has_segment(MAIL_SEGMENTS) {
            return TrafficCategory::Mail;
        }

        if shape.host_starts_with(API_HOST_PREFIXES)
            || shape.first_segment_is(API_SEGMENTS)
            || shape.has_segment(&["api"])
            || shape.segments.first().is_some_and(|s| is_version_segment(s))
            || shape.extension_in(API_EXTENSIONS)
        {
            return TrafficCategory::Api;
        }

        if shape.host_starts_with(STREAMING_HOST_PREFIXES)
            || shape.has_segment(STREAMING_SEGMENTS)
            || shape.extension_in(STREAMING_EXTENSIONS)
        {
            return TrafficCategory::Streaming;
        }

        if shape.host_starts_with(MEDIA_HOST_PREFIXES) || shape.extension_in(MEDIA_EXTENSIONS) {
            return TrafficCategory::Media;
        }

        if shape.host_starts_with(AUTH_HOST_PREFIXES) || shape.has_segment(AUTH_SEGMENTS) {
            return TrafficCategory::Auth;
        }

        if shape.host_starts_with(DOWNLOAD_HOST_PREFIXES)
            || shape.has_segment(DOWNLOAD_SEGMENTS)
            || shape.extension_in(DOWNLOAD_EXTENSIONS)
        {
            return TrafficCategory::Download;
        }

        TrafficCategory::Unknown
    }
}

/// Classify with the built-in rules.
pub fn classify_traffic(url: &str) -> TrafficCategory {
    TrafficClassifier.classify(url)
}
