//! The entry point for talking to a Review Board server.

use crate::api::{Resource, ResourceBuilder, ResourceError};
use crate::clients::{HttpClient, Transport};
use crate::config::ClientConfig;

/// A client bound to one Review Board server.
///
/// `ApiClient` wires a [`ClientConfig`] to an [`HttpClient`] and a
/// [`ResourceBuilder`]. Everything else is reached by navigating from
/// [`ApiClient::root`].
///
/// # Example
///
/// ```rust,ignore
/// use reviewboard_api::{ApiClient, ClientConfig, ServerUrl};
/// use reviewboard_api::api::Params;
///
/// let config = ClientConfig::builder()
///     .server_url(ServerUrl::new("https://reviews.example.com")?)
///     .build()?;
///
/// let client = ApiClient::new(config);
/// let root = client.root().await?;
/// let info = root.call("get_info", Params::new()).await?;
/// println!("{}", info.field("product")?);
/// ```
#[derive(Clone, Debug)]
pub struct ApiClient {
    config: ClientConfig,
    builder: ResourceBuilder,
}

impl ApiClient {
    /// Creates a client sending requests over HTTP.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let http_client = HttpClient::new(&config);
        Self::with_transport(config, http_client)
    }

    /// Creates a client sending requests through a custom transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            builder: ResourceBuilder::new(transport),
        }
    }

    /// Creates a client around an existing builder.
    ///
    /// Use this to install an unhandled-error hook on the builder first.
    #[must_use]
    pub const fn with_builder(config: ClientConfig, builder: ResourceBuilder) -> Self {
        Self { config, builder }
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the resource builder.
    #[must_use]
    pub const fn builder(&self) -> &ResourceBuilder {
        &self.builder
    }

    /// Fetches the API root resource.
    ///
    /// # Errors
    ///
    /// Returns any error produced by the request or by building the payload.
    pub async fn root(&self) -> Result<Resource, ResourceError> {
        self.builder.build_root(&self.config.api_root_url()).await
    }
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};
