//! Error types for the resource-binding layer.
//!
//! Failures fall into three families:
//!
//! - **Request errors** ([`ResourceError::Request`]): the server answered with
//!   `stat: fail` and a numeric error code, mapped to a [`RequestErrorKind`].
//! - **Response errors**: the response could not be turned into a resource,
//!   because the payload is undecodable ([`ResourceError::InvalidPayload`]),
//!   the token is missing ([`ResourceError::TokenNotFound`]) or resolves to
//!   a scalar ([`ResourceError::InvalidTokenType`]), or the `links` table is
//!   malformed ([`ResourceError::MalformedLinks`]).
//! - **Transport errors** ([`ResourceError::Http`]): the request never
//!   produced a usable response.
//!
//! # Example
//!
//! ```rust,ignore
//! use reviewboard_api::api::{RequestErrorKind, ResourceError};
//!
//! match root.call("get_review_request", params).await {
//!     Ok(review_request) => println!("{:?}", review_request.field("summary")),
//!     Err(ResourceError::Request(e)) if e.kind == RequestErrorKind::DoesNotExist => {
//!         println!("no such review request");
//!     }
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::clients::HttpError;

/// Known server error codes.
///
/// Every code is fixed by the server's Web API. Codes the client does not
/// know map to [`RequestErrorKind::Unknown`] rather than failing the lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestErrorKind {
    /// 100: one or more IDs in the URL don't exist.
    DoesNotExist,
    /// 101: the client may not access the resource or perform the operation.
    PermissionDenied,
    /// 103: the resource requires a logged-in client.
    NotLoggedIn,
    /// 104: the supplied credentials were rejected.
    LoginFailed,
    /// 105: one or more submitted fields failed validation.
    InvalidFormData,
    /// 203: the change number is unknown to the repository.
    InvalidChangeNumber,
    /// 204: another review request already uses the change number.
    ChangeNumberInUse,
    /// 205: the repository path does not contain a repository.
    MissingRepository,
    /// 206: the repository path or ID is unknown to the server.
    InvalidRepository,
    /// 207: a file was not found in the repository.
    RepositoryFileNotFound,
    /// 208: the user named in the request does not exist.
    InvalidUser,
    /// 209: the repository type does not support the action.
    RepositoryActionNotSupported,
    /// 210: fetching repository information failed.
    RepositoryInformationError,
    /// 212: the server-side changeset contains no files.
    EmptyChangeset,
    /// 213: the server could not store its configuration.
    ServerConfigurationError,
    /// 214: an unexpected SSH host key was encountered.
    BadHostKey,
    /// 215: an SSH host key needs to be verified.
    UnverifiedHostKey,
    /// 216: an HTTPS certificate needs to be verified.
    UnverifiedHostCertificate,
    /// 217: a public SSH key is required but not configured.
    MissingUserKey,
    /// 218: authentication with the repository failed.
    RepositoryAuthenticationError,
    /// Any code not listed above.
    Unknown,
}

impl RequestErrorKind {
    /// Maps a server error code to its kind.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reviewboard_api::api::RequestErrorKind;
    ///
    /// assert_eq!(RequestErrorKind::from_code(100), RequestErrorKind::DoesNotExist);
    /// assert_eq!(RequestErrorKind::from_code(999), RequestErrorKind::Unknown);
    /// ```
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            100 => Self::DoesNotExist,
            101 => Self::PermissionDenied,
            103 => Self::NotLoggedIn,
            104 => Self::LoginFailed,
            105 => Self::InvalidFormData,
            203 => Self::InvalidChangeNumber,
            204 => Self::ChangeNumberInUse,
            205 => Self::MissingRepository,
            206 => Self::InvalidRepository,
            207 => Self::RepositoryFileNotFound,
            208 => Self::InvalidUser,
            209 => Self::RepositoryActionNotSupported,
            210 => Self::RepositoryInformationError,
            212 => Self::EmptyChangeset,
            213 => Self::ServerConfigurationError,
            214 => Self::BadHostKey,
            215 => Self::UnverifiedHostKey,
            216 => Self::UnverifiedHostCertificate,
            217 => Self::MissingUserKey,
            218 => Self::RepositoryAuthenticationError,
            _ => Self::Unknown,
        }
    }

    /// Returns the stable code of this kind, or `None` for `Unknown`.
    #[must_use]
    pub const fn code(&self) -> Option<u32> {
        match self {
            Self::DoesNotExist => Some(100),
            Self::PermissionDenied => Some(101),
            Self::NotLoggedIn => Some(103),
            Self::LoginFailed => Some(104),
            Self::InvalidFormData => Some(105),
            Self::InvalidChangeNumber => Some(203),
            Self::ChangeNumberInUse => Some(204),
            Self::MissingRepository => Some(205),
            Self::InvalidRepository => Some(206),
            Self::RepositoryFileNotFound => Some(207),
            Self::InvalidUser => Some(208),
            Self::RepositoryActionNotSupported => Some(209),
            Self::RepositoryInformationError => Some(210),
            Self::EmptyChangeset => Some(212),
            Self::ServerConfigurationError => Some(213),
            Self::BadHostKey => Some(214),
            Self::UnverifiedHostKey => Some(215),
            Self::UnverifiedHostCertificate => Some(216),
            Self::MissingUserKey => Some(217),
            Self::RepositoryAuthenticationError => Some(218),
            Self::Unknown => None,
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::DoesNotExist => "does not exist",
            Self::PermissionDenied => "permission denied",
            Self::NotLoggedIn => "not logged in",
            Self::LoginFailed => "login failed",
            Self::InvalidFormData => "invalid form data",
            Self::InvalidChangeNumber => "invalid change number",
            Self::ChangeNumberInUse => "change number in use",
            Self::MissingRepository => "missing repository",
            Self::InvalidRepository => "invalid repository",
            Self::RepositoryFileNotFound => "repository file not found",
            Self::InvalidUser => "invalid user",
            Self::RepositoryActionNotSupported => "repository action not supported",
            Self::RepositoryInformationError => "repository information error",
            Self::EmptyChangeset => "empty changeset",
            Self::ServerConfigurationError => "server configuration error",
            Self::BadHostKey => "bad host key",
            Self::UnverifiedHostKey => "unverified host key",
            Self::UnverifiedHostCertificate => "unverified host certificate",
            Self::MissingUserKey => "missing user key",
            Self::RepositoryAuthenticationError => "repository authentication error",
            Self::Unknown => "unknown request error",
        }
    }
}

impl fmt::Display for RequestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A `stat: fail` answer from the server.
///
/// The full failing payload is kept because several kinds carry extra
/// keys (`fields` for invalid form data, `reason`, `repository`, ...).
#[derive(Clone, Debug, Error)]
#[error("{kind} (code {code}): {message}")]
pub struct RequestError {
    /// The error kind derived from `code`.
    pub kind: RequestErrorKind,
    /// The raw code reported by the server.
    pub code: u32,
    /// The server's message (`err.msg`).
    pub message: String,
    /// The HTTP status the error arrived with.
    pub http_status: u16,
    /// The complete decoded payload.
    pub payload: Value,
}

impl RequestError {
    /// Extracts a request error from a decoded payload.
    ///
    /// Returns `None` unless the payload's `stat` is `"fail"`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use reviewboard_api::api::{RequestError, RequestErrorKind};
    /// use serde_json::json;
    ///
    /// let payload = json!({"stat": "fail", "err": {"code": 101, "msg": "You don't have permission"}});
    /// let error = RequestError::from_payload(&payload, 403).unwrap();
    /// assert_eq!(error.kind, RequestErrorKind::PermissionDenied);
    ///
    /// assert!(RequestError::from_payload(&json!({"stat": "ok"}), 200).is_none());
    /// ```
    #[must_use]
    pub fn from_payload(payload: &Value, http_status: u16) -> Option<Self> {
        if payload.get("stat").and_then(Value::as_str) != Some("fail") {
            return None;
        }

        let err = payload.get("err");
        if err.is_none() {
            tracing::warn!(
                "Response with HTTP status {} reported stat=fail without an err object",
                http_status
            );
        }

        let code = err
            .and_then(|e| e.get("code"))
            .and_then(Value::as_u64)
            .and_then(|c| u32::try_from(c).ok())
            .unwrap_or(0);
        let message = err
            .and_then(|e| e.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Some(Self {
            kind: RequestErrorKind::from_code(code),
            code,
            message,
            http_status,
            payload: payload.clone(),
        })
    }

    /// Returns per-field validation messages from the payload's `fields` key.
    ///
    /// Sent with [`RequestErrorKind::InvalidFormData`]:
    /// ```json
    /// {"stat": "fail", "err": {"code": 105, "msg": "..."},
    ///  "fields": {"summary": ["This field is required."]}}
    /// ```
    #[must_use]
    pub fn field_errors(&self) -> HashMap<String, Vec<String>> {
        let mut result = HashMap::new();

        if let Some(Value::Object(map)) = self.payload.get("fields") {
            for (field, messages) in map {
                let msgs: Vec<String> = match messages {
                    Value::Array(arr) => arr
                        .iter()
                        .filter_map(|v| v.as_str().map(ToString::to_string))
                        .collect(),
                    Value::String(s) => vec![s.clone()],
                    _ => vec![messages.to_string()],
                };
                result.insert(field.clone(), msgs);
            }
        }

        result
    }
}

/// Error type for resource binding and resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The server reported a failure status.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The token is not a key of the payload.
    #[error("Token '{token}' not found in payload")]
    TokenNotFound {
        /// The token that was looked up.
        token: String,
    },

    /// The token resolved to something other than an object or a list.
    #[error("Token '{token}' must denote an object or a list, found {found}")]
    InvalidTokenType {
        /// The token that was looked up.
        token: String,
        /// The JSON type found under the token.
        found: &'static str,
    },

    /// The response body is not a usable payload.
    #[error("Invalid payload: {reason}")]
    InvalidPayload {
        /// What was wrong with the payload.
        reason: String,
    },

    /// `links` is present but is not an object.
    #[error("Malformed link table: expected an object, found {found}")]
    MalformedLinks {
        /// The JSON type found under `links`.
        found: &'static str,
    },

    /// The name is neither a field nor a method of the resource.
    #[error("Resource has no attribute '{name}'")]
    NoSuchAttribute {
        /// The name that was looked up.
        name: String,
    },

    /// A blocking call was made on an `_async` method, or the reverse.
    #[error("Method '{name}' cannot be called {attempted}")]
    CallMode {
        /// The method name.
        name: String,
        /// How the call was attempted.
        attempted: &'static str,
    },

    /// The resource has no link for a relation the operation needs.
    #[error("Resource has no '{relation}' link")]
    MissingRelation {
        /// The missing relation name.
        relation: &'static str,
    },

    /// A URI template placeholder had no value in the call parameters.
    #[error("Missing parameter '{parameter}' for URI template '{template}'")]
    MissingTemplateParameter {
        /// The template being expanded.
        template: String,
        /// The placeholder without a value.
        parameter: String,
    },

    /// An async call was made outside of a Tokio runtime.
    #[error("Async resource calls require a running Tokio runtime")]
    NoRuntime,

    /// An HTTP-level error occurred.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl ResourceError {
    /// Returns `true` for failures caused by the shape of the payload
    /// rather than by a failed lookup.
    ///
    /// Structural failures indicate a client/server mismatch; repeating the
    /// same call will fail the same way.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidTokenType { .. } | Self::InvalidPayload { .. } | Self::MalformedLinks { .. }
        )
    }

    /// Returns the request error kind, if the server reported one.
    #[must_use]
    pub const fn request_kind(&self) -> Option<RequestErrorKind> {
        match self {
            Self::Request(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Names the JSON type of a value for error messages.
pub(crate) const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Verify ResourceError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceError>();
};
