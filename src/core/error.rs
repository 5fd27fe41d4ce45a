use std::io;
use thiserror::Error;

/// Custom error types for the MX Speak stack
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unable to open channel '{port}': {source}")]
    ChannelOpen {
        /// Port identity that failed to open
        port: String,
        /// Underlying serial error
        #[source]
        source: serialport::Error,
    },

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Duplicate parameter: {0}")]
    DuplicateParameter(String),

    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Bytes required by the offset table
        expected: usize,
        /// Bytes actually supplied
        actual: usize,
    },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new parameter-not-found error
    pub fn parameter_not_found(name: impl Into<String>) -> Self {
        Error::ParameterNotFound(name.into())
    }

    /// Creates a new invalid value error
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Error::InvalidValue(msg.into())
    }

    /// Creates a new duplicate parameter error
    pub fn duplicate_parameter(name: impl Into<String>) -> Self {
        Error::DuplicateParameter(name.into())
    }

    /// Creates a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a new unsupported platform error
    pub fn unsupported_platform(platform: impl Into<String>) -> Self {
        Error::UnsupportedPlatform(platform.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::parameter_not_found("marker2");
        assert!(matches!(err, Error::ParameterNotFound(_)));
        assert_eq!(err.to_string(), "Parameter not found: marker2");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_frame_too_short_message() {
        let err = Error::FrameTooShort { expected: 55, actual: 12 };
        assert_eq!(
            err.to_string(),
            "Frame too short: expected at least 55 bytes, got 12"
        );
    }
}
