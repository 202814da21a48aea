//! HTTP response types for the Review Board API client.
//!
//! A response carries the raw body bytes; turning them into a payload is the
//! job of [`JsonFormat`](crate::api::JsonFormat), not of the transport.

use std::collections::HashMap;

/// An HTTP response as delivered by a [`Transport`](crate::clients::Transport).
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lowercase name (headers may repeat).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Vec<u8>) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Content-Type` header, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (k, v) in pairs {
            map.entry((*k).to_string()).or_default().push((*v).to_string());
        }
        map
    }

    #[test]
    fn test_is_ok_for_2xx_codes() {
        assert!(HttpResponse::new(200, HashMap::new(), vec![]).is_ok());
        assert!(HttpResponse::new(204, HashMap::new(), vec![]).is_ok());
        assert!(!HttpResponse::new(301, HashMap::new(), vec![]).is_ok());
        assert!(!HttpResponse::new(404, HashMap::new(), vec![]).is_ok());
        assert!(!HttpResponse::new(500, HashMap::new(), vec![]).is_ok());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(
            200,
            headers(&[("content-type", "application/json")]),
            vec![],
        );

        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn test_text_is_lossy() {
        let response = HttpResponse::new(500, HashMap::new(), vec![b'o', b'k', 0xff]);
        assert!(response.text().starts_with("ok"));
    }
}
