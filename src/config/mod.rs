//! Configuration types for the Review Board API client.
//!
//! # Overview
//!
//! - [`ClientConfig`]: The configuration struct holding all client settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`ServerUrl`]: A validated server URL
//!
//! # Example
//!
//! ```rust
//! use reviewboard_api::{ClientConfig, ServerUrl};
//!
//! let config = ClientConfig::builder()
//!     .server_url(ServerUrl::new("https://reviews.example.com").unwrap())
//!     .user_agent_prefix("rbt/0.1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_root_url(), "https://reviews.example.com/api/");
//! ```

mod newtypes;

pub use newtypes::ServerUrl;

use std::collections::HashMap;

use crate::error::ConfigError;

/// Default location of the Web API below the server URL.
pub const DEFAULT_API_PATH: &str = "/api/";

/// Configuration for the Review Board API client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    server_url: ServerUrl,
    api_path: String,
    user_agent_prefix: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the server URL.
    #[must_use]
    pub const fn server_url(&self) -> &ServerUrl {
        &self.server_url
    }

    /// Returns the API path (e.g. `/api/`).
    #[must_use]
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the headers added to every request.
    #[must_use]
    pub const fn extra_headers(&self) -> &HashMap<String, String> {
        &self.extra_headers
    }

    /// Returns the URL of the API root resource.
    #[must_use]
    pub fn api_root_url(&self) -> String {
        format!("{}{}", self.server_url.as_ref(), self.api_path)
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `server_url` is required. All other fields have defaults.
///
/// # Defaults
///
/// - `api_path`: `/api/`
/// - `user_agent_prefix`: `None`
/// - `extra_headers`: empty
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    server_url: Option<ServerUrl>,
    api_path: Option<String>,
    user_agent_prefix: Option<String>,
    extra_headers: HashMap<String, String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server URL (required).
    #[must_use]
    pub fn server_url(mut self, url: ServerUrl) -> Self {
        self.server_url = Some(url);
        self
    }

    /// Sets the API path. Leading and trailing slashes are normalized.
    #[must_use]
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = Some(path.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    /// Builds the [`ClientConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `server_url` is not
    /// set, or [`ConfigError::InvalidApiPath`] if the API path is empty or
    /// contains a scheme.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let server_url = self.server_url.ok_or(ConfigError::MissingRequiredField {
            field: "server_url",
        })?;

        let api_path = match self.api_path {
            Some(path) => normalize_api_path(&path)?,
            None => DEFAULT_API_PATH.to_string(),
        };

        Ok(ClientConfig {
            server_url,
            api_path,
            user_agent_prefix: self.user_agent_prefix,
            extra_headers: self.extra_headers,
        })
    }
}

fn normalize_api_path(path: &str) -> Result<String, ConfigError> {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.contains("://") {
        return Err(ConfigError::InvalidApiPath {
            path: path.to_string(),
        });
    }
    Ok(format!("/{trimmed}/"))
}
