//! Payload encoding for the Web API.

use serde_json::{Map, Value};

use crate::api::errors::ResourceError;

/// The JSON wire format used by the Web API.
///
/// The server answers every request in JSON when asked for
/// `application/json`. Request parameters travel as form fields or query
/// parameters, so [`JsonFormat::encode_field`] turns structured values into
/// their JSON text and leaves plain strings untouched.
///
/// # Example
///
/// ```rust
/// use reviewboard_api::api::JsonFormat;
/// use serde_json::json;
///
/// let format = JsonFormat;
/// assert_eq!(format.mime_type(), "application/json");
/// assert_eq!(format.decode(b"").unwrap(), json!({}));
/// assert_eq!(format.encode_field(&json!("open")), "open");
/// assert_eq!(format.encode_field(&json!([1, 2])), "[1,2]");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonFormat;

impl JsonFormat {
    /// The MIME type requested from and sent to the server.
    pub const MIME_TYPE: &'static str = "application/json";

    /// Returns the MIME type of this format.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        Self::MIME_TYPE
    }

    /// Decodes a response body.
    ///
    /// An empty (or whitespace-only) body decodes to an empty object, which
    /// is what `DELETE` and some `PUT` endpoints return.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPayload`] if the body is not JSON.
    pub fn decode(&self, body: &[u8]) -> Result<Value, ResourceError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }

        serde_json::from_slice(body).map_err(|e| ResourceError::InvalidPayload {
            reason: format!("response body is not valid JSON: {e}"),
        })
    }

    /// Encodes a value as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPayload`] if serialization fails.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, ResourceError> {
        serde_json::to_vec(value).map_err(|e| ResourceError::InvalidPayload {
            reason: format!("failed to encode payload: {e}"),
        })
    }

    /// Encodes a single value for use as a form field or query parameter.
    #[must_use]
    pub fn encode_field(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}
