//! Error types shared by Ingesta binaries

use thiserror::Error;

/// Result type alias for Ingesta startup operations
pub type Result<T> = std::result::Result<T, IngestaError>;

/// Errors raised while bootstrapping a process (configuration, logging)
#[derive(Error, Debug)]
pub enum IngestaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl IngestaError {
    /// Build a configuration error for an environment variable that failed to parse
    pub fn invalid_var(name: &str, value: &str) -> Self {
        IngestaError::Config(format!("invalid value for {}: {:?}", name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_var_message() {
        let err = IngestaError::invalid_var("INGESTA_PORT", "eighty");
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid value for INGESTA_PORT: \"eighty\""
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: IngestaError = io.into();
        assert!(matches!(err, IngestaError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }
}
