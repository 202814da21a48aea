//! A canned-response transport for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::api::Params;
use crate::clients::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportFuture};

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    url: String,
    query: Vec<(String, String)>,
    code: u16,
    body: Vec<u8>,
}

impl Route {
    fn matches(&self, request: &HttpRequest) -> bool {
        self.method == request.http_method
            && self.url == request.url
            && self
                .query
                .iter()
                .all(|(key, value)| request.query.get(key) == Some(value))
    }
}

/// Serves registered payloads and records every request it receives.
///
/// When several routes match, the one with the most query constraints
/// wins. Unmatched requests get a 404 with a "does not exist" payload.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, method: HttpMethod, url: &str, body: Value) {
        self.respond_status(method, url, 200, body);
    }

    pub(crate) fn respond_status(&self, method: HttpMethod, url: &str, code: u16, body: Value) {
        self.add(method, url, &[], code, body.to_string().into_bytes());
    }

    pub(crate) fn respond_with_query(
        &self,
        method: HttpMethod,
        url: &str,
        query: &[(&str, &str)],
        body: Value,
    ) {
        self.add(method, url, query, 200, body.to_string().into_bytes());
    }

    pub(crate) fn respond_raw(&self, method: HttpMethod, url: &str, code: u16, body: Vec<u8>) {
        self.add(method, url, &[], code, body);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn add(&self, method: HttpMethod, url: &str, query: &[(&str, &str)], code: u16, body: Vec<u8>) {
        self.routes.lock().unwrap().push(Route {
            method,
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            code,
            body,
        });
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> TransportFuture<'_> {
        let response = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .filter(|route| route.matches(&request))
            .max_by_key(|route| route.query.len())
            .map_or_else(
                || {
                    let body = json!({"stat": "fail", "err": {"code": 100, "msg": "Object does not exist"}});
                    HttpResponse::new(404, HashMap::new(), body.to_string().into_bytes())
                },
                |route| HttpResponse::new(route.code, HashMap::new(), route.body.clone()),
            );

        self.requests.lock().unwrap().push(request);
        Box::pin(std::future::ready(Ok(response)))
    }
}

pub(crate) fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
