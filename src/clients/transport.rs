//! The transport seam between the resource layer and the network.
//!
//! The resource layer never talks to `reqwest` directly. It holds an
//! `Arc<dyn Transport>` and awaits [`Transport::send`]; the asynchronous,
//! callback-driven path is built on top of the same future by spawning it on
//! the Tokio runtime (see [`BoundOperation`](crate::api::BoundOperation)).
//! Tests substitute their own transport to serve canned payloads.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::clients::errors::HttpError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

/// The future returned by [`Transport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// A transport shared by every resource produced from one root binding.
pub type SharedTransport = Arc<dyn Transport>;

/// Sends requests and delivers raw responses.
///
/// Implementations return every response the server produced, whatever its
/// status code; only failures to obtain a response at all are errors.
/// Interpreting status codes and error payloads is left to the caller.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends a request and resolves once the full response is available.
    fn send(&self, request: HttpRequest) -> TransportFuture<'_>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        (**self).send(request)
    }
}
