//! Error types for client configuration.
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation.
//!
//! # Example
//!
//! ```rust
//! use reviewboard_api::{ConfigError, ServerUrl};
//!
//! let result = ServerUrl::new("reviews.example.com");
//! assert!(matches!(result, Err(ConfigError::InvalidServerUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur during client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Server URL is invalid.
    #[error("Invalid server URL '{url}'. Please provide a valid URL with scheme (e.g., 'https://reviews.example.com').")]
    InvalidServerUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// API path is invalid.
    #[error("Invalid API path '{path}'. Expected an absolute path such as '/api/'.")]
    InvalidApiPath {
        /// The invalid path that was provided.
        path: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_server_url_error_message() {
        let error = ConfigError::InvalidServerUrl {
            url: "not a url".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("not a url"));
        assert!(message.contains("with scheme"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField {
            field: "server_url",
        };
        let message = error.to_string();
        assert!(message.contains("server_url"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::InvalidApiPath {
            path: "api".to_string(),
        };
        let _: &dyn std::error::Error = &error;
    }
}
