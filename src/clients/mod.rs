//! HTTP client types for Review Board API communication.
//!
//! This module is the transport layer underneath the resource bindings in
//! [`api`](crate::api). It knows how to send a request and hand back the raw
//! response; it knows nothing about payloads, links or tokens.
//!
//! # Overview
//!
//! - [`Transport`]: The seam the resource layer sends requests through
//! - [`HttpClient`]: The `reqwest`-backed transport
//! - [`HttpRequest`]: A request to be sent to the server
//! - [`HttpResponse`]: A raw response from the server
//! - [`HttpMethod`]: Supported HTTP methods (GET, POST, PUT, DELETE)
//! - [`RequestBody`]: Form fields, multipart uploads or pre-encoded bytes
//! - [`FilePart`]: A file sent in a multipart upload
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::clients::{HttpClient, HttpMethod, HttpRequest, Transport};
//!
//! let client = HttpClient::new(&config);
//! let request = HttpRequest::builder(HttpMethod::Get, "https://reviews.example.com/api/")
//!     .build()
//!     .unwrap();
//!
//! let response = client.send(request).await?;
//! println!("{}", response.text());
//! ```

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;

pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{FilePart, HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody};
pub use http_response::HttpResponse;
pub use transport::{SharedTransport, Transport, TransportFuture};
