//! Error types for FormFill.
//!
//! Library crates use [`FormFillError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all FormFill operations.
#[derive(Debug, thiserror::Error)]
pub enum FormFillError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a form or calling the model.
    #[error("network error: {0}")]
    Network(String),

    /// HTML or response parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Mapping generator error (API, auth, or response shape).
    #[error("mapping error: {0}")]
    Mapping(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (empty form, bad input, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Knowledge source could not be read.
    #[error("knowledge source unavailable: {path:?}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Knowledge source was read but is not a JSON object.
    #[error("knowledge source malformed: {message}")]
    SourceMalformed { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FormFillError>;

impl FormFillError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a malformed-source error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::SourceMalformed {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FormFillError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = FormFillError::malformed("root is an array");
        assert!(err.to_string().contains("root is an array"));
    }

    #[test]
    fn source_unavailable_mentions_path() {
        let err = FormFillError::SourceUnavailable {
            path: PathBuf::from("/nope/user_data.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let msg = err.to_string();
        assert!(msg.contains("user_data.json"));
        assert!(msg.contains("gone"));
    }
}
