//! HTTP-specific error types for the Review Board API client.
//!
//! This module contains error types for transport operations: responses the
//! server answered with a failure status that the resource layer could not
//! interpret, requests that fail validation before they are sent, and
//! network failures.
//!
//! # Error Handling
//!
//! - [`HttpResponseError`]: Non-2xx HTTP responses without a decodable error payload
//! - [`InvalidHttpRequestError`]: When a request fails validation before sending
//! - [`HttpError`]: Unified error type encompassing all HTTP-related errors
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::clients::{HttpError, Transport};
//!
//! match transport.send(request).await {
//!     Ok(response) => println!("Status: {}", response.code),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.message),
//!     Err(HttpError::InvalidRequest(e)) => println!("Invalid request: {}", e),
//!     Err(HttpError::Network(e)) => println!("Network error: {}", e),
//! }
//! ```

use thiserror::Error;

/// Error returned when the server answers with a non-successful status.
///
/// The resource layer only produces this error when the response body could
/// not be interpreted as a Review Board error payload (`stat: fail`).
///
/// # Example
///
/// ```rust
/// use reviewboard_api::clients::HttpResponseError;
///
/// let error = HttpResponseError {
///     code: 502,
///     message: "Bad Gateway".to_string(),
///     url: Some("https://reviews.example.com/api/".to_string()),
/// };
///
/// assert!(error.to_string().contains("502"));
/// ```
#[derive(Debug, Error)]
#[error("HTTP {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// The response body, lossily decoded as text.
    pub message: String,
    /// The URL the failing request was sent to.
    pub url: Option<String>,
}

/// Error returned when an HTTP request fails validation.
///
/// This error is raised before a request is sent if it fails validation
/// checks, such as an unknown HTTP method in a link table or a form body on
/// a method that does not carry one.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::clients::InvalidHttpRequestError;
///
/// let error = InvalidHttpRequestError::InvalidMethod {
///     method: "FETCH".to_string(),
/// };
///
/// assert_eq!(error.to_string(), "Invalid Http method FETCH.");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The HTTP method is not one of the supported methods.
    #[error("Invalid Http method {method}.")]
    InvalidMethod {
        /// The invalid method that was provided.
        method: String,
    },

    /// The request URL is empty.
    #[error("Cannot send a request without a URL.")]
    MissingUrl,

    /// A body was attached to a method that sends its parameters in the query.
    #[error("Cannot send a body with {method}.")]
    UnexpectedBody {
        /// The HTTP method that does not accept a body.
        method: String,
    },
}

/// Unified error type for all HTTP-related errors.
///
/// # Example
///
/// ```rust,ignore
/// use reviewboard_api::HttpError;
///
/// match result {
///     Ok(response) => { /* handle success */ }
///     Err(HttpError::Response(e)) => { /* handle API error */ }
///     Err(HttpError::InvalidRequest(e)) => { /* handle validation error */ }
///     Err(HttpError::Network(e)) => { /* handle network error */ }
/// }
/// ```
#[derive(Debug, Error)]
pub enum HttpError {
    /// An HTTP response error (non-2xx status code).
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}
