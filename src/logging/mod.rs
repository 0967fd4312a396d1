//! Structured logging: tracing diagnostics on stderr, ndjson records on stdout.

mod format;

pub use format::StructuredLogger;
