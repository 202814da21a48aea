//! Integration tests for resource binding against a mock Review Board server.
//!
//! These tests drive the full stack: `ApiClient` → `HttpClient` → HTTP →
//! payload decoding → `ResourceBuilder`.

use std::time::{Duration, Instant};

use reviewboard_api::api::{Params, RequestErrorKind, ResourceError};
use reviewboard_api::{ApiClient, ClientConfig, FilePart, ServerUrl};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ApiClient {
    let config = ClientConfig::builder()
        .server_url(ServerUrl::new(server.uri()).unwrap())
        .user_agent_prefix("rbtests/1.0")
        .build()
        .unwrap();
    ApiClient::new(config)
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

async fn mount_root(server: &MockServer) {
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "product": {"name": "Review Board", "version": "7.0"},
            "links": {
                "self": {"href": format!("{base}/api/"), "method": "GET"},
                "info": {"href": format!("{base}/api/info/"), "method": "GET"},
                "review_requests": {"href": format!("{base}/api/review-requests/"), "method": "GET"}
            },
            "uri_templates": {
                "review_request": format!("{base}/api/review-requests/{{review_request_id}}/"),
                "user": format!("{base}/api/users/{{username}}/")
            }
        })))
        .mount(server)
        .await;
}

fn review_request_payload(base: &str, summary: &str) -> serde_json::Value {
    let href = format!("{base}/api/review-requests/8/");
    json!({
        "stat": "ok",
        "review_request": {
            "id": 8,
            "summary": summary,
            "status": "pending",
            "links": {
                "self": {"href": href, "method": "GET"},
                "update": {"href": href, "method": "PUT"},
                "delete": {"href": href, "method": "DELETE"},
                "diffs": {"href": format!("{base}/api/review-requests/8/diffs/"), "method": "GET"}
            }
        }
    })
}

// ============================================================================
// Root Bootstrap
// ============================================================================

#[tokio::test]
async fn test_root_binds_links_and_uri_templates() {
    let server = MockServer::start().await;
    mount_root(&server).await;

    let root = assert_ok!(client(&server).root().await);

    assert_eq!(
        root.field("product").unwrap()["name"],
        json!("Review Board")
    );
    assert!(root.field("uri_templates").is_err());
    assert!(root.field("links").is_err());
    assert!(root.field("stat").is_err());

    for name in [
        "get_self",
        "get_info",
        "get_review_requests",
        "get_review_request",
        "get_user",
        "get_user_async",
    ] {
        assert!(root.has_method(name), "missing {name}");
    }
}

#[tokio::test]
async fn test_root_sends_user_agent_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stat": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client(&server).root().await);

    let requests = server.received_requests().await.unwrap();
    let user_agent = requests[0].headers.get("user-agent").unwrap();
    assert!(user_agent.to_str().unwrap().starts_with("rbtests/1.0 | "));
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_uri_template_navigation_unwraps_by_name() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/review-requests/8/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_request_payload(&server.uri(), "Fix")),
        )
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let request = assert_ok!(
        root.call("get_review_request", params(&[("review_request_id", "8")]))
            .await
    );

    assert!(!request.is_list());
    assert_eq!(request.token(), Some("review_request"));
    assert_eq!(request.field("summary").unwrap(), &json!("Fix"));
    assert!(request.has_method("get_diffs"));
    assert!(!request.has_method("get_update"));
}

#[tokio::test]
async fn test_navigation_passes_params_as_query() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/review-requests/"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "total_results": 1,
            "review_requests": [{"id": 8, "summary": "Fix"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let list = root
        .call("get_review_requests", params(&[("status", "pending")]))
        .await
        .unwrap()
        .into_list()
        .unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list.field("total_results").unwrap(), &json!(1));
}

#[tokio::test]
async fn test_missing_template_parameter_makes_no_request() {
    let server = MockServer::start().await;
    mount_root(&server).await;

    let root = client(&server).root().await.unwrap();
    let error = assert_err!(root.call("get_user", Params::new()).await);

    assert!(matches!(
        error,
        ResourceError::MissingTemplateParameter { parameter, .. } if parameter == "username"
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_fail_payload_maps_to_request_error() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/users/ghost/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "stat": "fail",
            "err": {"code": 100, "msg": "Object does not exist"}
        })))
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let error = assert_err!(root.call("get_user", params(&[("username", "ghost")])).await);

    match error {
        ResourceError::Request(e) => {
            assert_eq!(e.kind, RequestErrorKind::DoesNotExist);
            assert_eq!(e.code, 100);
            assert_eq!(e.http_status, 404);
            assert_eq!(e.message, "Object does not exist");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_error_code_maps_to_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "stat": "fail",
            "err": {"code": 999, "msg": "Something new"}
        })))
        .mount(&server)
        .await;

    let error = assert_err!(client(&server).root().await);
    assert_eq!(error.request_kind(), Some(RequestErrorKind::Unknown));
}

#[tokio::test]
async fn test_call_or_else_recovers_from_failure() {
    let server = MockServer::start().await;
    mount_root(&server).await;

    let root = client(&server).root().await.unwrap();
    let fallback = root.clone();
    let result = root
        .call_or_else("get_info", Params::new(), move |_| Some(fallback.into()))
        .await
        .unwrap();

    assert!(result.unwrap().field("product").is_ok());
}

// ============================================================================
// Mutation
// ============================================================================

#[tokio::test]
async fn test_save_puts_only_changed_fields() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/review-requests/8/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_request_payload(&server.uri(), "Old")),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/review-requests/8/"))
        .and(body_string_contains("summary=Shipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(review_request_payload(&server.uri(), "Shipped")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let mut request = root
        .call("get_review_request", params(&[("review_request_id", "8")]))
        .await
        .unwrap();

    assert!(!request.is_changed());
    request.set("summary", "Shipped");
    assert!(request.is_changed());

    let updated = assert_ok!(request.save().await).unwrap();
    assert_eq!(updated.field("summary").unwrap(), &json!("Shipped"));
    assert!(!request.is_changed());

    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    let body = String::from_utf8(put.body).unwrap();
    assert!(!body.contains("status"));
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/review-requests/8/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_request_payload(&server.uri(), "x")),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/review-requests/8/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let request = root
        .call("get_review_request", params(&[("review_request_id", "8")]))
        .await
        .unwrap();

    assert_ok!(request.delete().await);
}

#[tokio::test]
async fn test_diff_upload_sends_multipart_file() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    let diffs_url = format!("{}/api/review-requests/8/diffs/", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/review-requests/8/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(review_request_payload(&server.uri(), "x")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/review-requests/8/diffs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "total_results": 0,
            "diffs": [],
            "links": {"create": {"href": diffs_url, "method": "POST"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/review-requests/8/diffs/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "stat": "ok",
            "diff": {"id": 1, "revision": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let request = root
        .call("get_review_request", params(&[("review_request_id", "8")]))
        .await
        .unwrap();
    let diffs = request.call("get_diffs", Params::new()).await.unwrap();

    let file = FilePart::new("path", "fix.diff", b"--- a/README\n+++ b/README\n".to_vec())
        .with_content_type("text/x-patch");
    let diff = assert_ok!(
        diffs
            .create_with_files(params(&[("basedir", "/trunk")]), vec![file])
            .await
    );
    assert_eq!(diff.field("revision").unwrap(), &json!(1));

    let upload = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let content_type = upload.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8(upload.body).unwrap();
    assert!(body.contains(r#"name="path"; filename="fix.diff""#));
    assert!(body.contains("Content-Type: text/x-patch"));
    assert!(body.contains("+++ b/README"));
    assert!(body.contains(r#"name="basedir""#));
    assert!(body.contains("/trunk"));
}

// ============================================================================
// Slow Responses
// ============================================================================

#[tokio::test]
async fn test_blocking_call_waits_for_slow_response() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/info/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({"stat": "ok", "info": {"product": {"version": "7.0"}}})),
        )
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let started = Instant::now();
    let info = assert_ok!(root.call("get_info", Params::new()).await);

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(info.token(), Some("info"));
}

// ============================================================================
// Background Calls
// ============================================================================

#[tokio::test]
async fn test_async_variant_delivers_to_callback() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/info/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok",
            "info": {"product": {"version": "7.0"}}
        })))
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();

    let handle = assert_ok!(root.call_async("get_info_async", Params::new(), move |info| {
        let _ = tx.send(info.field("product").cloned().ok());
    }));

    handle.await.unwrap();
    assert_eq!(rx.await.unwrap(), Some(json!({"version": "7.0"})));
}

#[tokio::test]
async fn test_async_variant_delivers_failure() {
    let server = MockServer::start().await;
    mount_root(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/info/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "stat": "fail",
            "err": {"code": 101, "msg": "You don't have permission for this"}
        })))
        .mount(&server)
        .await;

    let root = client(&server).root().await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();

    assert_ok!(root.call_async_with_failure(
        "get_info_async",
        Params::new(),
        |_| panic!("unexpected success"),
        move |error| {
            let _ = tx.send(error.request_kind());
        },
    ));

    assert_eq!(rx.await.unwrap(), Some(RequestErrorKind::PermissionDenied));
}

#[tokio::test]
async fn test_call_modes_are_not_interchangeable() {
    let server = MockServer::start().await;
    mount_root(&server).await;

    let root = client(&server).root().await.unwrap();

    let error = assert_err!(root.call("get_info_async", Params::new()).await);
    assert!(matches!(error, ResourceError::CallMode { .. }));

    let error = assert_err!(root.call_async("get_info", Params::new(), |_| {}));
    assert!(matches!(error, ResourceError::CallMode { .. }));
}
