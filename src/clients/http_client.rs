//! HTTP client for Review Board API communication.
//!
//! This module provides the [`HttpClient`] type, the `reqwest`-backed
//! [`Transport`] used outside of tests.

use std::collections::HashMap;

use reqwest::multipart::{Form, Part};

use crate::clients::errors::HttpError;
use crate::clients::http_request::{FilePart, HttpMethod, HttpRequest, RequestBody};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::{Transport, TransportFuture};
use crate::config::ClientConfig;

/// Library version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for making requests to a Review Board server.
///
/// The client handles:
/// - Default headers including User-Agent and Accept
/// - Query parameters, form bodies and multipart uploads
/// - Header collection on the response
///
/// It performs no retries and enforces no timeout of its own.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::{ClientConfig, ServerUrl};
/// use reviewboard_api::clients::HttpClient;
///
/// let config = ClientConfig::builder()
///     .server_url(ServerUrl::new("https://reviews.example.com").unwrap())
///     .build()
///     .unwrap();
///
/// let client = HttpClient::new(&config);
/// assert_eq!(
///     client.default_headers().get("Accept"),
///     Some(&"application/json".to_string())
/// );
/// ```
#[derive(Debug)]
pub struct HttpClient {
    /// The internal reqwest HTTP client.
    client: reqwest::Client,
    /// Default headers to include in all requests.
    default_headers: HashMap<String, String>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS initialization failure).
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let rust_version = env!("CARGO_PKG_RUST_VERSION");
        let user_agent = format!(
            "{user_agent_prefix}ReviewBoard API Library v{SDK_VERSION} | Rust {rust_version}"
        );

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        for (key, value) in config.extra_headers() {
            default_headers.insert(key.clone(), value.clone());
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            default_headers,
        }
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Sends an HTTP request and collects the full response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - Network error occurs (`Network`)
    ///
    /// Non-2xx responses are returned as `Ok`; the caller decides what
    /// they mean.
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
            HttpMethod::Delete => self.client.delete(&request.url),
        };

        let mut headers = self.default_headers.clone();
        for (key, value) in &request.headers {
            headers.insert(key.clone(), value.clone());
        }
        for (key, value) in &headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }

        match &request.body {
            Some(RequestBody::Form(fields)) => {
                req_builder = req_builder.form(fields);
            }
            Some(RequestBody::Multipart { fields, files }) => {
                req_builder = req_builder.multipart(Self::multipart_form(fields, files)?);
            }
            Some(RequestBody::Raw {
                content_type,
                bytes,
            }) => {
                req_builder = req_builder
                    .header("Content-Type", content_type)
                    .body(bytes.clone());
            }
            None => {}
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let res_headers = Self::parse_response_headers(res.headers());
        let body = res.bytes().await?.to_vec();

        Ok(HttpResponse::new(code, res_headers, body))
    }

    /// Assembles a `multipart/form-data` form from fields and files.
    fn multipart_form(
        fields: &HashMap<String, String>,
        files: &[FilePart],
    ) -> Result<Form, HttpError> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        for file in files {
            let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
            if let Some(content_type) = &file.content_type {
                part = part.mime_str(content_type)?;
            }
            form = form.part(file.field.clone(), part);
        }
        Ok(form)
    }

    /// Parses response headers into a `HashMap`.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

impl Transport for HttpClient {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        Box::pin(self.request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerUrl;

    fn create_test_config(prefix: Option<&str>) -> ClientConfig {
        let mut builder = ClientConfig::builder()
            .server_url(ServerUrl::new("https://reviews.example.com").unwrap());
        if let Some(prefix) = prefix {
            builder = builder.user_agent_prefix(prefix);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_user_agent_header_format() {
        let client = HttpClient::new(&create_test_config(None));

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("ReviewBoard API Library v"));
        assert!(user_agent.contains("Rust"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let client = HttpClient::new(&create_test_config(Some("post-review/2.0")));

        let user_agent = client.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("post-review/2.0 | "));
        assert!(user_agent.contains("ReviewBoard API Library"));
    }

    #[test]
    fn test_accept_header_is_json() {
        let client = HttpClient::new(&create_test_config(None));

        assert_eq!(
            client.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_extra_headers_are_merged_into_defaults() {
        let config = ClientConfig::builder()
            .server_url(ServerUrl::new("https://reviews.example.com").unwrap())
            .header("X-Requested-With", "reviewboard-api")
            .build()
            .unwrap();
        let client = HttpClient::new(&config);

        assert_eq!(
            client.default_headers().get("X-Requested-With"),
            Some(&"reviewboard-api".to_string())
        );
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpClient>();
    }
}
