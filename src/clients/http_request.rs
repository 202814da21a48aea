//! HTTP request types for the Review Board API client.
//!
//! This module provides the [`HttpRequest`] type and its builder. Requests
//! are addressed by absolute URL because every URL the client follows comes
//! from a server payload (`links`, `uri_templates`) rather than from a path
//! the caller assembles.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods that can appear in a Review Board link table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for updating resources.
    Put,
    /// HTTP DELETE method for removing resources.
    Delete,
}

impl HttpMethod {
    /// Returns the method as it appears on the wire (`GET`, `POST`, ...).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` if request parameters travel in a form body
    /// rather than in the query string.
    #[must_use]
    pub const fn sends_form_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Post => write!(f, "post"),
            Self::Put => write!(f, "put"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = InvalidHttpRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(InvalidHttpRequestError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// A file sent as one part of a `multipart/form-data` body.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::clients::FilePart;
///
/// let part = FilePart::new("path", "fix.diff", b"--- a\n+++ b\n".to_vec())
///     .with_content_type("text/x-patch");
///
/// assert_eq!(part.field, "path");
/// assert_eq!(part.content_type.as_deref(), Some("text/x-patch"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilePart {
    /// The form field the file is sent under.
    pub field: String,
    /// The file name reported to the server.
    pub file_name: String,
    /// The content type of the part. Defaults to `application/octet-stream`.
    pub content_type: Option<String>,
    /// The file contents.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Creates a file part without an explicit content type.
    #[must_use]
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Sets the content type of the part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// URL-encoded form fields.
    Form(HashMap<String, String>),
    /// Form fields and files, sent as `multipart/form-data`.
    Multipart {
        /// Plain text fields.
        fields: HashMap<String, String>,
        /// File parts.
        files: Vec<FilePart>,
    },
    /// Pre-encoded bytes with their content type.
    Raw {
        /// Value for the `Content-Type` header.
        content_type: String,
        /// The encoded body.
        bytes: Vec<u8>,
    },
}

/// An HTTP request to be sent through a [`Transport`](crate::clients::Transport).
///
/// Use [`HttpRequest::builder`] to construct requests with the builder pattern.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::clients::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder(HttpMethod::Get, "https://reviews.example.com/api/")
///     .query_param("start", "25")
///     .header("Accept", "application/json")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.query.get("start"), Some(&"25".to_string()));
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The absolute URL for this request.
    pub url: String,
    /// Query parameters to append to the URL.
    pub query: HashMap<String, String>,
    /// Headers to include in the request.
    pub headers: HashMap<String, String>,
    /// The request body, if any.
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `url` is empty
    /// - a body is attached to a `GET` or `DELETE` request
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if self.url.trim().is_empty() {
            return Err(InvalidHttpRequestError::MissingUrl);
        }

        if self.body.is_some() && !self.http_method.sends_form_body() {
            return Err(InvalidHttpRequestError::UnexpectedBody {
                method: self.http_method.to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<RequestBody>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Merges a set of query parameters, overriding existing keys.
    #[must_use]
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query.extend(query);
        self
    }

    /// Adds a single header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets a form body.
    #[must_use]
    pub fn form(mut self, fields: HashMap<String, String>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    /// Sets a `multipart/form-data` body of fields and files.
    #[must_use]
    pub fn multipart(mut self, fields: HashMap<String, String>, files: Vec<FilePart>) -> Self {
        self.body = Some(RequestBody::Multipart { fields, files });
        self
    }

    /// Sets a pre-encoded body.
    #[must_use]
    pub fn raw_body(mut self, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.body = Some(RequestBody::Raw {
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            query: self.query,
            headers: self.headers,
            body: self.body,
        };
        request.verify()?;
        Ok(request)
    }
}
