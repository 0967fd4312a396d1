use thiserror::Error;

/// Errors raised by the URL signal engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input that cannot be treated as text at all
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A signature pattern failed to compile
    #[error("Rule compile error in {family}: pattern {pattern:?}: {source}")]
    RuleCompile {
        family: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidInput("url is absent".to_string());
        assert_eq!(err.to_string(), "Invalid input: url is absent");
    }

    #[test]
    fn test_rule_compile_error_names_family() {
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = EngineError::RuleCompile {
            family: "sql_keyword",
            pattern: "(unclosed".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Rule compile error in sql_keyword"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
