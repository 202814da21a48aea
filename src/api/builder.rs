//! Turning payloads into resources.
//!
//! [`ResourceBuilder`] is the only producer of [`Resource`]s. It resolves the
//! token of a response, copies the payload's fields, parses its `links` table
//! and binds one operation pair per navigation relation. It also owns the
//! request pipeline shared by every bound operation: send through the
//! [`Transport`], decode with [`JsonFormat`], and map failure payloads to
//! [`ResourceError`]s.
//!
//! # Token Resolution
//!
//! `build(payload, token)` unwraps the payload as follows:
//!
//! | `payload[token]`     | Result                                                      |
//! |----------------------|-------------------------------------------------------------|
//! | no token given       | resource built from the payload itself                      |
//! | absent               | [`ResourceError::TokenNotFound`]                            |
//! | list                 | [`ResourceList`] of the items, outer fields minus the token |
//! | object               | resource built from the nested object                       |
//! | anything else        | [`ResourceError::InvalidTokenType`]                         |
//!
//! In every case the `links` and `stat` keys never become fields.
//!
//! A navigation method's response is built with the relation name as its
//! token; a `self` refetch reuses the token of the resource it belongs to.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::api::errors::{json_type_name, RequestError, ResourceError};
use crate::api::format::JsonFormat;
use crate::api::links::{
    LinkTable, CREATE_RELATION, DELETE_RELATION, LINKS_KEY, SELF_RELATION, STAT_KEY,
    UPDATE_RELATION, URI_TEMPLATES_KEY,
};
use crate::api::list::ResourceList;
use crate::api::operation::{method_name, BoundOperation, Continuation, Target};
use crate::api::resource::{Binding, Resource};
use crate::api::template::UriTemplate;
use crate::api::tracking::FieldStore;
use crate::clients::{
    HttpError, HttpMethod, HttpRequest, HttpResponseError, SharedTransport, Transport,
};

/// Receives errors of background calls made without a failure callback.
///
/// Called with the method name and the error.
pub type UnhandledErrorHook = Arc<dyn Fn(&str, &ResourceError) + Send + Sync>;

/// Builds resources from payloads and runs the requests of bound operations.
///
/// A builder is cheap to clone. Every resource built by it, and every
/// resource reached from those, shares the builder's transport.
///
/// # Example
///
/// ```rust,ignore
/// use reviewboard_api::api::ResourceBuilder;
/// use reviewboard_api::clients::HttpClient;
///
/// let builder = ResourceBuilder::new(HttpClient::new(&config));
/// let root = builder.build_root("https://reviews.example.com/api/").await?;
/// println!("{:?}", root.method_names().collect::<Vec<_>>());
/// ```
#[derive(Clone)]
pub struct ResourceBuilder {
    transport: SharedTransport,
    format: JsonFormat,
    on_unhandled_error: UnhandledErrorHook,
}

impl ResourceBuilder {
    /// Creates a builder sending requests through `transport`.
    #[must_use]
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    /// Creates a builder from an already shared transport.
    #[must_use]
    pub fn with_shared_transport(transport: SharedTransport) -> Self {
        Self {
            transport,
            format: JsonFormat,
            on_unhandled_error: Arc::new(log_unhandled_error),
        }
    }

    /// Replaces the hook receiving unhandled background errors.
    ///
    /// The default hook logs the error with `tracing::error!`.
    #[must_use]
    pub fn with_unhandled_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &ResourceError) + Send + Sync + 'static,
    {
        self.on_unhandled_error = Arc::new(hook);
        self
    }

    /// Returns the payload format.
    #[must_use]
    pub const fn format(&self) -> &JsonFormat {
        &self.format
    }

    /// Returns the shared transport.
    #[must_use]
    pub const fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    /// Builds a resource or a list from a decoded payload.
    ///
    /// No request is made; all I/O happens later in bound operations.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::InvalidPayload`] if the payload, or an item of a
    ///   list, is not an object
    /// - [`ResourceError::TokenNotFound`] if `token` is not a key of the payload
    /// - [`ResourceError::InvalidTokenType`] if `token` names a scalar
    /// - [`ResourceError::MalformedLinks`] if a `links` value is not an object
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let binding = builder.build(json!({"tok": {"baz": "qux", "links": {}}}), Some("tok"))?;
    /// assert_eq!(binding.field("baz")?, &json!("qux"));
    /// ```
    pub fn build(&self, payload: Value, token: Option<&str>) -> Result<Binding, ResourceError> {
        let mut payload = expect_object(payload)?;

        let Some(token) = token else {
            return self.build_resource(payload, None).map(Binding::Resource);
        };

        match payload.remove(token) {
            None => Err(ResourceError::TokenNotFound {
                token: token.to_string(),
            }),
            Some(Value::Array(items)) => {
                let items = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(item) => self.build_resource(item, None),
                        other => Err(ResourceError::InvalidPayload {
                            reason: format!(
                                "items of '{token}' must be objects, found {}",
                                json_type_name(&other)
                            ),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let outer = self.build_resource(payload, Some(token))?;
                Ok(Binding::List(ResourceList::new(outer, items)))
            }
            Some(Value::Object(inner)) => self
                .build_resource(inner, Some(token))
                .map(Binding::Resource),
            Some(other) => Err(ResourceError::InvalidTokenType {
                token: token.to_string(),
                found: json_type_name(&other),
            }),
        }
    }

    /// Fetches the API root and builds it.
    ///
    /// Besides the methods from its `links`, the root gets one `get_<name>`
    /// method pair per entry of its `uri_templates` object. A template whose
    /// method name is already taken by a link is skipped with a warning.
    /// The `uri_templates` key does not become a field.
    ///
    /// # Errors
    ///
    /// Returns any error produced by the request or by building the payload,
    /// or [`ResourceError::InvalidPayload`] if `uri_templates` is not an
    /// object of strings.
    pub async fn build_root(&self, url: &str) -> Result<Resource, ResourceError> {
        let request = HttpRequest::builder(HttpMethod::Get, url)
            .header("Accept", self.format.mime_type())
            .build()
            .map_err(HttpError::from)?;

        let root = self.build_root_payload(self.send(request).await?)?;

        tracing::debug!(
            "Bootstrapped API root at {} with {} methods",
            url,
            root.method_names().count()
        );
        Ok(root)
    }

    /// Sends a request and returns the decoded payload of a successful
    /// response.
    pub(crate) async fn send(&self, request: HttpRequest) -> Result<Value, ResourceError> {
        let url = request.url.clone();
        let method = request.http_method;

        let response = self.transport.send(request).await?;
        tracing::debug!(
            "{} {} returned HTTP {}",
            method.as_str(),
            url,
            response.code
        );

        let payload = match self.format.decode(&response.body) {
            Ok(payload) => payload,
            Err(_) if !response.is_ok() => {
                return Err(HttpError::from(HttpResponseError {
                    code: response.code,
                    message: response.text(),
                    url: Some(url),
                })
                .into())
            }
            Err(error) => return Err(error),
        };

        if let Some(error) = RequestError::from_payload(&payload, response.code) {
            tracing::debug!("{} {} failed: {}", method.as_str(), url, error);
            return Err(error.into());
        }

        if !response.is_ok() {
            return Err(HttpError::from(HttpResponseError {
                code: response.code,
                message: response.text(),
                url: Some(url),
            })
            .into());
        }

        Ok(payload)
    }

    /// Builds a response payload according to an operation's continuation.
    pub(crate) fn finish(
        &self,
        payload: Value,
        continuation: &Continuation,
    ) -> Result<Binding, ResourceError> {
        match continuation {
            Continuation::Token(token) => self.build(payload, token.as_deref()),
            Continuation::Mutation(hint) => {
                let token = mutation_token(&payload, hint.as_deref());
                self.build(payload, token.as_deref())
            }
            Continuation::Root => self.build_root_payload(payload).map(Binding::Resource),
        }
    }

    pub(crate) fn report_unhandled(&self, name: &str, error: &ResourceError) {
        (self.on_unhandled_error)(name, error);
    }

    /// Builds the root payload: its `uri_templates` become methods instead
    /// of a field, and its `self` link rebuilds it the same way.
    fn build_root_payload(&self, payload: Value) -> Result<Resource, ResourceError> {
        let mut payload = expect_object(payload)?;
        let templates = payload.remove(URI_TEMPLATES_KEY);

        let mut root = self.bind_resource(payload, None, &Continuation::Root)?;
        if let Some(templates) = templates {
            self.bind_uri_templates(&mut root, templates)?;
        }
        Ok(root)
    }

    fn build_resource(
        &self,
        payload: Map<String, Value>,
        token: Option<&str>,
    ) -> Result<Resource, ResourceError> {
        let refetch = Continuation::Token(token.map(ToString::to_string));
        self.bind_resource(payload, token, &refetch)
    }

    fn bind_resource(
        &self,
        mut payload: Map<String, Value>,
        token: Option<&str>,
        refetch: &Continuation,
    ) -> Result<Resource, ResourceError> {
        let links = LinkTable::parse(&payload)?;
        payload.remove(LINKS_KEY);
        payload.remove(STAT_KEY);

        let mut fields = FieldStore::constructing();
        for (name, value) in payload {
            fields.assign(name, value);
        }
        fields.seal();

        let token = token.map(ToString::to_string);
        let mut resource = Resource::new(fields, token.clone());

        if let Some(link) = links.get(SELF_RELATION) {
            let [blocking, background] = BoundOperation::pair(
                self,
                SELF_RELATION,
                &Target::Href(link.href.clone()),
                link.method,
                refetch,
            );
            resource.set_refetch(blocking.clone());
            resource.attach(blocking);
            resource.attach(background);
        }

        for relation in [CREATE_RELATION, UPDATE_RELATION, DELETE_RELATION] {
            if let Some(link) = links.get(relation) {
                let verb = BoundOperation::verb(
                    self,
                    relation,
                    link,
                    Continuation::Mutation(token.clone()),
                );
                resource.set_verb(relation, verb);
            }
        }

        for (relation, link) in links.navigation() {
            let pair = BoundOperation::pair(
                self,
                relation,
                &Target::Href(link.href.clone()),
                link.method,
                &Continuation::Token(Some(relation.to_string())),
            );
            for operation in pair {
                resource.attach(operation);
            }
        }

        Ok(resource)
    }

    fn bind_uri_templates(&self, root: &mut Resource, templates: Value) -> Result<(), ResourceError> {
        let templates = match templates {
            Value::Object(templates) => templates,
            other => {
                return Err(ResourceError::InvalidPayload {
                    reason: format!(
                        "{URI_TEMPLATES_KEY} must be an object, found {}",
                        json_type_name(&other)
                    ),
                })
            }
        };

        for (name, href) in templates {
            let Value::String(href) = href else {
                return Err(ResourceError::InvalidPayload {
                    reason: format!("URI template '{name}' must be a string"),
                });
            };

            if root.has_method(&method_name(&name, HttpMethod::Get)) {
                tracing::warn!(
                    "URI template '{}' shadows a link of the same name; keeping the link",
                    name
                );
                continue;
            }

            let pair = BoundOperation::pair(
                self,
                &name,
                &Target::Template(UriTemplate::new(href)),
                HttpMethod::Get,
                &Continuation::Token(Some(name.clone())),
            );
            for operation in pair {
                root.attach(operation);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for ResourceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBuilder")
            .field("transport", &self.transport)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

// Verify ResourceBuilder is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceBuilder>();
};

fn log_unhandled_error(name: &str, error: &ResourceError) {
    tracing::error!("Unhandled error in background call {}: {}", name, error);
}

fn expect_object(payload: Value) -> Result<Map<String, Value>, ResourceError> {
    match payload {
        Value::Object(map) => Ok(map),
        other => Err(ResourceError::InvalidPayload {
            reason: format!("expected an object, found {}", json_type_name(&other)),
        }),
    }
}

/// Picks the token for a mutation response.
///
/// The hint wins when it is a key of the payload. Otherwise the sole
/// object-valued key other than `links` and `stat` is used; with zero or
/// several candidates the payload is built as is.
fn mutation_token(payload: &Value, hint: Option<&str>) -> Option<String> {
    let map = payload.as_object()?;

    if let Some(hint) = hint.filter(|hint| map.contains_key(*hint)) {
        return Some(hint.to_string());
    }

    let mut candidates = map
        .iter()
        .filter(|(key, value)| {
            value.is_object() && key.as_str() != LINKS_KEY && key.as_str() != STAT_KEY
        })
        .map(|(key, _)| key);

    let first = candidates.next()?;
    if candidates.next().is_some() {
        return None;
    }
    Some(first.clone())
}
