//! Operations synthesized from link tables.
//!
//! Every navigation relation of a resource yields a pair of
//! [`BoundOperation`]s: a blocking variant, awaited by the caller, and a
//! background variant that runs on the Tokio runtime and reports through
//! callbacks.
//!
//! # Naming
//!
//! | Link                                  | Blocking    | Background        |
//! |---------------------------------------|-------------|-------------------|
//! | `{"diff": {"method": "GET", ...}}`    | `get_diff`  | `get_diff_async`  |
//! | `{"close": {"method": "POST", ...}}`  | `close`     | `close_async`     |
//!
//! # Parameters
//!
//! Call parameters are merged into the query string for `GET` and `DELETE`
//! and sent as form fields for `POST` and `PUT`. For URI templates the
//! placeholders are filled first; the remaining parameters follow the same
//! rule.

use std::fmt;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;

use crate::api::builder::ResourceBuilder;
use crate::api::errors::ResourceError;
use crate::api::links::Link;
use crate::api::resource::Binding;
use crate::api::template::UriTemplate;
use crate::api::Params;
use crate::clients::{FilePart, HttpError, HttpMethod, HttpRequest};

/// Prefix of the blocking method name for `GET` relations.
pub const FETCH_METHOD_PREFIX: &str = "get_";
/// Suffix of every background method name.
pub const ASYNC_METHOD_SUFFIX: &str = "_async";

/// Returns the blocking method name for a relation.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::api::method_name;
/// use reviewboard_api::clients::HttpMethod;
///
/// assert_eq!(method_name("diff", HttpMethod::Get), "get_diff");
/// assert_eq!(method_name("close", HttpMethod::Post), "close");
/// ```
#[must_use]
pub fn method_name(relation: &str, method: HttpMethod) -> String {
    if method == HttpMethod::Get {
        format!("{FETCH_METHOD_PREFIX}{relation}")
    } else {
        relation.to_string()
    }
}

/// Returns the background method name for a relation.
#[must_use]
pub fn async_method_name(relation: &str, method: HttpMethod) -> String {
    format!("{}{ASYNC_METHOD_SUFFIX}", method_name(relation, method))
}

/// How a bound operation must be called.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    /// Awaited by the caller, returning the built resource.
    Blocking,
    /// Spawned on the runtime, reporting through callbacks.
    Background,
}

/// Where an operation sends its request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A fixed URL from a link table.
    Href(String),
    /// A URI template from the root resource.
    Template(UriTemplate),
}

impl Target {
    /// Returns the URL or template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Href(href) => href,
            Self::Template(template) => template.as_str(),
        }
    }
}

/// How a successful response becomes a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// Build the response with a fixed token.
    Token(Option<String>),
    /// Build a mutation response, unwrapping it by the token hint when it
    /// matches, else by its sole object-valued key.
    Mutation(Option<String>),
    /// Build the response as the API root, binding its URI templates.
    Root,
}

type FailureCallback = Box<dyn FnOnce(ResourceError) + Send>;

/// A request bound to a relation, plus what to do with its response.
///
/// Calling an operation any number of times issues a fresh request each
/// time; results are never cached.
#[derive(Clone)]
pub struct BoundOperation {
    name: String,
    relation: String,
    target: Target,
    method: HttpMethod,
    mode: CallMode,
    continuation: Continuation,
    builder: ResourceBuilder,
}

impl BoundOperation {
    /// Binds the blocking and background variants of one relation.
    pub(crate) fn pair(
        builder: &ResourceBuilder,
        relation: &str,
        target: &Target,
        method: HttpMethod,
        continuation: &Continuation,
    ) -> [Self; 2] {
        let bind = |name: String, mode: CallMode| Self {
            name,
            relation: relation.to_string(),
            target: target.clone(),
            method,
            mode,
            continuation: continuation.clone(),
            builder: builder.clone(),
        };

        [
            bind(method_name(relation, method), CallMode::Blocking),
            bind(async_method_name(relation, method), CallMode::Background),
        ]
    }

    /// Binds a mutation verb (`create`, `update`, `delete`).
    pub(crate) fn verb(
        builder: &ResourceBuilder,
        relation: &str,
        link: &Link,
        continuation: Continuation,
    ) -> Self {
        Self {
            name: relation.to_string(),
            relation: relation.to_string(),
            target: Target::Href(link.href.clone()),
            method: link.method,
            mode: CallMode::Blocking,
            continuation,
            builder: builder.clone(),
        }
    }

    /// Returns the method name this operation is attached under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the relation (or URI template name) the operation follows.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the request target.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns how the operation must be called.
    #[must_use]
    pub const fn mode(&self) -> CallMode {
        self.mode
    }

    /// Performs the request and builds the response.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::CallMode`] for background operations, and
    /// otherwise any error from the request or from building the response.
    pub async fn invoke(&self, params: Params) -> Result<Binding, ResourceError> {
        self.expect_mode(CallMode::Blocking)?;
        self.fetch(params).await
    }

    /// Performs the request with file parts, sent as `multipart/form-data`
    /// together with `params`.
    ///
    /// # Errors
    ///
    /// Same as [`BoundOperation::invoke`]. Files on a `GET` or `DELETE`
    /// operation are rejected before sending.
    pub async fn invoke_with_files(
        &self,
        params: Params,
        files: Vec<FilePart>,
    ) -> Result<Binding, ResourceError> {
        self.expect_mode(CallMode::Blocking)?;
        self.fetch_with_files(params, files).await
    }

    /// Performs the request, handing a failure to `on_failure`.
    ///
    /// The handler's return value becomes the result.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::CallMode`] for background operations.
    pub async fn invoke_or_else<F>(
        &self,
        params: Params,
        on_failure: F,
    ) -> Result<Option<Binding>, ResourceError>
    where
        F: FnOnce(ResourceError) -> Option<Binding>,
    {
        self.expect_mode(CallMode::Blocking)?;
        match self.fetch(params).await {
            Ok(binding) => Ok(Some(binding)),
            Err(error) => Ok(on_failure(error)),
        }
    }

    /// Spawns the request on the current Tokio runtime.
    ///
    /// `on_success` runs on the runtime with the built resource. A failure
    /// goes to the builder's unhandled-error hook.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::CallMode`] for blocking operations and
    /// [`ResourceError::NoRuntime`] outside of a runtime.
    pub fn spawn<S>(&self, params: Params, on_success: S) -> Result<JoinHandle<()>, ResourceError>
    where
        S: FnOnce(Binding) + Send + 'static,
    {
        self.spawn_inner(params, on_success, None)
    }

    /// Spawns the request with both a success and a failure callback.
    ///
    /// # Errors
    ///
    /// Same as [`BoundOperation::spawn`].
    pub fn spawn_with_failure<S, F>(
        &self,
        params: Params,
        on_success: S,
        on_failure: F,
    ) -> Result<JoinHandle<()>, ResourceError>
    where
        S: FnOnce(Binding) + Send + 'static,
        F: FnOnce(ResourceError) + Send + 'static,
    {
        self.spawn_inner(params, on_success, Some(Box::new(on_failure)))
    }

    fn spawn_inner<S>(
        &self,
        params: Params,
        on_success: S,
        on_failure: Option<FailureCallback>,
    ) -> Result<JoinHandle<()>, ResourceError>
    where
        S: FnOnce(Binding) + Send + 'static,
    {
        self.expect_mode(CallMode::Background)?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ResourceError::NoRuntime)?;

        let operation = self.clone();
        Ok(runtime.spawn(async move {
            match operation.fetch(params).await {
                Ok(binding) => on_success(binding),
                Err(error) => match on_failure {
                    Some(callback) => callback(error),
                    None => operation.builder.report_unhandled(&operation.name, &error),
                },
            }
        }))
    }

    /// Performs the request regardless of call mode.
    pub(crate) async fn fetch(&self, params: Params) -> Result<Binding, ResourceError> {
        self.fetch_with_files(params, Vec::new()).await
    }

    pub(crate) async fn fetch_with_files(
        &self,
        params: Params,
        files: Vec<FilePart>,
    ) -> Result<Binding, ResourceError> {
        let request = self.request_with_files(params, files)?;
        let payload = self.builder.send(request).await?;
        self.builder.finish(payload, &self.continuation)
    }

    /// Performs the request and discards the response body.
    pub(crate) async fn fetch_discarding(&self, params: Params) -> Result<(), ResourceError> {
        let request = self.request(params)?;
        self.builder.send(request).await.map(drop)
    }

    /// Encodes field values as call parameters.
    pub(crate) fn encode_fields(&self, fields: &Map<String, Value>) -> Params {
        let format = self.builder.format();
        fields
            .iter()
            .map(|(name, value)| (name.clone(), format.encode_field(value)))
            .collect()
    }

    /// Builds the HTTP request for a call.
    pub(crate) fn request(&self, params: Params) -> Result<HttpRequest, ResourceError> {
        self.request_with_files(params, Vec::new())
    }

    /// Builds the HTTP request for a call carrying file parts.
    ///
    /// With files, the parameters and files go out as one multipart body.
    pub(crate) fn request_with_files(
        &self,
        mut params: Params,
        files: Vec<FilePart>,
    ) -> Result<HttpRequest, ResourceError> {
        let url = match &self.target {
            Target::Href(href) => href.clone(),
            Target::Template(template) => template.expand(&mut params)?,
        };

        let mut builder = HttpRequest::builder(self.method, url)
            .header("Accept", self.builder.format().mime_type());

        builder = match (self.method.sends_form_body(), files.is_empty()) {
            (true, true) => builder.form(params),
            (true, false) => builder.multipart(params, files),
            (false, true) => builder.query(params),
            // Rejected by `build`: GET and DELETE carry no body.
            (false, false) => builder.query(params).multipart(Params::new(), files),
        };

        builder.build().map_err(|e| HttpError::from(e).into())
    }

    fn expect_mode(&self, mode: CallMode) -> Result<(), ResourceError> {
        if self.mode == mode {
            return Ok(());
        }

        Err(ResourceError::CallMode {
            name: self.name.clone(),
            attempted: match mode {
                CallMode::Blocking => "without callbacks",
                CallMode::Background => "with callbacks",
            },
        })
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("target", &self.target.as_str())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

// Verify BoundOperation is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BoundOperation>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{params, MockTransport};
    use crate::clients::RequestBody;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn builder(transport: &Arc<MockTransport>) -> ResourceBuilder {
        ResourceBuilder::new(Arc::clone(transport))
    }

    fn href(url: &str) -> Target {
        Target::Href(url.to_string())
    }

    #[test]
    fn test_method_naming_rule() {
        assert_eq!(method_name("diff", HttpMethod::Get), "get_diff");
        assert_eq!(async_method_name("diff", HttpMethod::Get), "get_diff_async");
        assert_eq!(method_name("close", HttpMethod::Post), "close");
        assert_eq!(async_method_name("close", HttpMethod::Post), "close_async");
        assert_eq!(method_name("draft", HttpMethod::Put), "draft");
        assert_eq!(async_method_name("draft", HttpMethod::Delete), "draft_async");
    }

    #[test]
    fn test_pair_produces_blocking_and_background_variants() {
        let transport = Arc::new(MockTransport::new());
        let [blocking, background] = BoundOperation::pair(
            &builder(&transport),
            "diffs",
            &href("https://rb.example.com/api/r/1/diffs/"),
            HttpMethod::Get,
            &Continuation::Token(Some("diffs".to_string())),
        );

        assert_eq!(blocking.name(), "get_diffs");
        assert_eq!(blocking.mode(), CallMode::Blocking);
        assert_eq!(background.name(), "get_diffs_async");
        assert_eq!(background.mode(), CallMode::Background);
        assert_eq!(background.relation(), "diffs");
        assert_eq!(
            background.target().as_str(),
            "https://rb.example.com/api/r/1/diffs/"
        );
    }

    #[test]
    fn test_get_params_go_to_query() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "review_requests",
            &href("https://rb.example.com/api/review-requests/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        let request = op.request(params(&[("status", "pending")])).unwrap();
        assert_eq!(request.http_method, HttpMethod::Get);
        assert_eq!(request.query.get("status"), Some(&"pending".to_string()));
        assert!(request.body.is_none());
        assert_eq!(
            request.headers.get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_post_params_go_to_form_body() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "close",
            &href("https://rb.example.com/api/r/1/close/"),
            HttpMethod::Post,
            &Continuation::Token(None),
        );

        let request = op.request(params(&[("description", "done")])).unwrap();
        assert!(request.query.is_empty());
        assert_eq!(
            request.body,
            Some(RequestBody::Form(params(&[("description", "done")])))
        );
    }

    #[test]
    fn test_files_go_to_multipart_body() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "diffs",
            &href("https://rb.example.com/api/r/1/diffs/"),
            HttpMethod::Post,
            &Continuation::Token(None),
        );
        let file = FilePart::new("path", "fix.diff", b"--- a\n+++ b\n".to_vec());

        let request = op
            .request_with_files(params(&[("basedir", "/trunk")]), vec![file.clone()])
            .unwrap();

        assert_eq!(
            request.body,
            Some(RequestBody::Multipart {
                fields: params(&[("basedir", "/trunk")]),
                files: vec![file],
            })
        );
    }

    #[test]
    fn test_files_on_get_are_rejected() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "diffs",
            &href("https://rb.example.com/api/r/1/diffs/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        let result =
            op.request_with_files(Params::new(), vec![FilePart::new("path", "a.diff", Vec::new())]);

        assert!(matches!(
            result,
            Err(ResourceError::Http(HttpError::InvalidRequest(
                crate::clients::InvalidHttpRequestError::UnexpectedBody { .. }
            )))
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_template_target_expands_and_queries_the_rest() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "user",
            &Target::Template(UriTemplate::new("https://rb.example.com/api/users/{username}/")),
            HttpMethod::Get,
            &Continuation::Token(Some("user".to_string())),
        );

        let request = op
            .request(params(&[("username", "admin"), ("expand", "avatar")]))
            .unwrap();
        assert_eq!(request.url, "https://rb.example.com/api/users/admin/");
        assert_eq!(request.query, params(&[("expand", "avatar")]));
    }

    #[tokio::test]
    async fn test_invoke_builds_response_with_relation_token() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            HttpMethod::Get,
            "https://rb.example.com/api/r/1/repository/",
            json!({"stat": "ok", "repository": {"id": 3, "name": "rbtools"}}),
        );

        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "repository",
            &href("https://rb.example.com/api/r/1/repository/"),
            HttpMethod::Get,
            &Continuation::Token(Some("repository".to_string())),
        );

        let binding = op.invoke(Params::new()).await.unwrap();
        assert_eq!(binding.field("name").unwrap(), &json!("rbtools"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_each_invocation_issues_a_fresh_request() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            HttpMethod::Get,
            "https://rb.example.com/api/info/",
            json!({"info": {"version": "7.0"}}),
        );

        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "info",
            &href("https://rb.example.com/api/info/"),
            HttpMethod::Get,
            &Continuation::Token(Some("info".to_string())),
        );

        op.invoke(Params::new()).await.unwrap();
        op.invoke(Params::new()).await.unwrap();
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_call_mode_mismatch_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        let [blocking, background] = BoundOperation::pair(
            &builder(&transport),
            "info",
            &href("https://rb.example.com/api/info/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        let result = background.invoke(Params::new()).await;
        assert!(matches!(
            result,
            Err(ResourceError::CallMode { name, attempted: "without callbacks" }) if name == "get_info_async"
        ));

        let result = blocking.spawn(Params::new(), |_| {});
        assert!(matches!(
            result,
            Err(ResourceError::CallMode { attempted: "with callbacks", .. })
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_or_else_hands_error_to_handler() {
        let transport = Arc::new(MockTransport::new());
        let [op, _] = BoundOperation::pair(
            &builder(&transport),
            "missing",
            &href("https://rb.example.com/api/missing/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let result = op
            .invoke_or_else(Params::new(), move |error| {
                *seen_clone.lock().unwrap() = error.request_kind();
                None
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(
            *seen.lock().unwrap(),
            Some(crate::api::RequestErrorKind::DoesNotExist)
        );
    }

    #[tokio::test]
    async fn test_spawn_delivers_success_to_callback() {
        let transport = Arc::new(MockTransport::new());
        transport.respond(
            HttpMethod::Get,
            "https://rb.example.com/api/session/",
            json!({"session": {"authenticated": true}}),
        );

        let [_, op] = BoundOperation::pair(
            &builder(&transport),
            "session",
            &href("https://rb.example.com/api/session/"),
            HttpMethod::Get,
            &Continuation::Token(Some("session".to_string())),
        );

        let (tx, rx) = tokio::sync::oneshot::channel();
        let handle = op
            .spawn(Params::new(), move |binding| {
                let _ = tx.send(binding.field("authenticated").cloned().ok());
            })
            .unwrap();

        handle.await.unwrap();
        assert_eq!(rx.await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_spawn_without_failure_callback_reports_unhandled() {
        let transport = Arc::new(MockTransport::new());
        let reported = Arc::new(Mutex::new(Vec::new()));
        let reported_clone = Arc::clone(&reported);
        let builder = builder(&transport).with_unhandled_error_hook(move |name, error| {
            reported_clone
                .lock()
                .unwrap()
                .push((name.to_string(), error.request_kind()));
        });

        let [_, op] = BoundOperation::pair(
            &builder,
            "gone",
            &href("https://rb.example.com/api/gone/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        op.spawn(Params::new(), |_| panic!("should not succeed"))
            .unwrap()
            .await
            .unwrap();

        let reported = reported.lock().unwrap();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].0, "get_gone_async");
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let transport = Arc::new(MockTransport::new());
        let [_, op] = BoundOperation::pair(
            &builder(&transport),
            "info",
            &href("https://rb.example.com/api/info/"),
            HttpMethod::Get,
            &Continuation::Token(None),
        );

        let result = op.spawn(Params::new(), |_| {});
        assert!(matches!(result, Err(ResourceError::NoRuntime)));
    }
}
