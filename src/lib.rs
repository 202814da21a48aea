//! # Review Board API Rust Client
//!
//! Dynamic resource bindings for the Review Board Web API.
//!
//! ## Overview
//!
//! The Web API describes itself: every payload carries a `links` table
//! naming the resources reachable from it, and the root resource publishes
//! URI templates for direct access. This crate provides:
//!
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - An async HTTP transport ([`clients::HttpClient`]) behind the
//!   [`clients::Transport`] trait
//! - Resources whose methods are synthesized from links at runtime
//!   ([`api::Resource`])
//! - Change tracking with delta extraction for partial updates
//! - Collection responses with transparent pagination ([`api::ResourceList`])
//! - A typed error taxonomy mapping the server's error codes
//!   ([`api::ResourceError`])
//!
//! ## Quick Start
//!
//! ```rust
//! use reviewboard_api::{ClientConfig, ServerUrl};
//!
//! let config = ClientConfig::builder()
//!     .server_url(ServerUrl::new("https://reviews.example.com").unwrap())
//!     .user_agent_prefix("my-tool/1.0")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_root_url(), "https://reviews.example.com/api/");
//! ```
//!
//! ## Navigating the API
//!
//! ```rust,ignore
//! use reviewboard_api::{ApiClient, ClientConfig, ServerUrl};
//! use reviewboard_api::api::Params;
//!
//! let client = ApiClient::new(config);
//! let root = client.root().await?;
//!
//! // Links become methods: `get_<relation>` for GET links
//! let requests = root.call("get_review_requests", Params::new()).await?;
//! let requests = requests.into_list().unwrap();
//!
//! // `len` is the server-side total; `all` pages through every item
//! println!("{} review requests", requests.len());
//! let mut all = requests.all(Params::new());
//! while let Some(request) = all.next_item().await {
//!     let mut request = request?;
//!     request.set("summary", "Updated summary");
//!     request.save().await?;
//! }
//! ```
//!
//! ## Background Calls
//!
//! Every method has an `_async` variant that runs on the Tokio runtime and
//! reports through callbacks:
//!
//! ```rust,ignore
//! root.call_async_with_failure(
//!     "get_info_async",
//!     Params::new(),
//!     |info| println!("{:?}", info.field("product")),
//!     |error| eprintln!("failed: {error}"),
//! )?;
//! ```
//!
//! ## Design Principles
//!
//! - **Unknown schema**: fields and methods live in maps, reached through
//!   accessor functions instead of generated types
//! - **Fail-fast validation**: configuration errors surface at build time
//! - **Thread-safe**: all public types are `Send + Sync`
//! - **Async-first**: designed for use with Tokio runtime

pub mod api;
mod client;
pub mod clients;
pub mod config;
pub mod error;

// Re-export public types at crate root for convenience
pub use client::ApiClient;
pub use config::{ClientConfig, ClientConfigBuilder, ServerUrl};
pub use error::ConfigError;

// Re-export HTTP client types at crate root for convenience
pub use clients::{
    FilePart, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResponseError,
    InvalidHttpRequestError, Transport,
};

// Re-export resource types at crate root for convenience
pub use api::{
    Binding, Params, RequestError, RequestErrorKind, Resource, ResourceBuilder, ResourceError,
    ResourceList,
};
