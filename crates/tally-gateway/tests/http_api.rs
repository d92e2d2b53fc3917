//! REST surface driven in-process through the router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt;

use tally_gateway::{app_state::AppState, config, router};

fn app() -> Router {
    let cfg = config::load_from_str(
        "version: 1\nregistry:\n  max_instances: 3\ncounters:\n  - id: main\n",
    )
    .unwrap();
    router::build_router(AppState::new(cfg).unwrap())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json(s: &str) -> Json {
    serde_json::from_str(s).unwrap()
}

#[tokio::test]
async fn fresh_counter_then_set_42() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/v1/counters", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json(&body);
    assert_eq!(created["value"], 0);
    let id = created["counter"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, &format!("/v1/counters/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["value"], 0);

    let (status, body) =
        call(&app, Method::PUT, &format!("/v1/counters/{id}"), Some(r#"{"value":42}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["value"], 42);
}

#[tokio::test]
async fn increment_and_decrement_from_5() {
    let app = app();
    call(&app, Method::PUT, "/v1/counters/main", Some(r#"{"value":"5"}"#)).await;
    let (_, body) = call(&app, Method::POST, "/v1/counters/main/increment", None).await;
    assert_eq!(json(&body)["value"], 6);

    call(&app, Method::PUT, "/v1/counters/main", Some(r#"{"value":5}"#)).await;
    let (_, body) = call(&app, Method::POST, "/v1/counters/main/decrement", None).await;
    assert_eq!(json(&body)["value"], 4);
}

#[tokio::test]
async fn underflow_at_zero_is_conflict() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/v1/counters/main/decrement", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "UNDERFLOW");

    let (_, body) = call(&app, Method::GET, "/v1/counters/main", None).await;
    assert_eq!(json(&body)["value"], 0);
}

#[tokio::test]
async fn overflow_at_max_is_conflict() {
    let app = app();
    let max = u128::MAX.to_string();
    let set = format!(r#"{{"value":{max}}}"#);
    let (status, _) = call(&app, Method::PUT, "/v1/counters/main", Some(&set)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/v1/counters/main/increment", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "OVERFLOW");

    // u128::MAX does not fit serde_json::Value without arbitrary_precision; compare text.
    let (_, body) = call(&app, Method::GET, "/v1/counters/main", None).await;
    assert_eq!(body, format!(r#"{{"counter":"main","value":{max}}}"#));
}

#[tokio::test]
async fn set_beyond_width_is_out_of_range() {
    let app = app();
    let too_big = r#"{"value":"340282366920938463463374607431768211456"}"#;
    let (status, body) = call(&app, Method::PUT, "/v1/counters/main", Some(too_big)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "OUT_OF_RANGE");

    let (status, body) =
        call(&app, Method::PUT, "/v1/counters/main", Some(r#"{"value":-1}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "OUT_OF_RANGE");

    let (status, body) =
        call(&app, Method::PUT, "/v1/counters/main", Some(r#"{"valu":1}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn registry_lifecycle_over_http() {
    let app = app();
    let (status, body) = call(&app, Method::POST, "/v1/counters", Some(r#"{"id":"jobs"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["counter"], "jobs");

    let (status, body) = call(&app, Method::POST, "/v1/counters", Some(r#"{"id":"jobs"}"#)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "ALREADY_EXISTS");

    call(&app, Method::POST, "/v1/counters", None).await;
    let (status, body) = call(&app, Method::POST, "/v1/counters", None).await;
    assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
    assert_eq!(json(&body)["error"], "REGISTRY_FULL");

    let (_, body) = call(&app, Method::GET, "/v1/counters", None).await;
    assert_eq!(json(&body)["counters"].as_array().unwrap().len(), 3);

    let (status, _) = call(&app, Method::DELETE, "/v1/counters/jobs", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = call(&app, Method::GET, "/v1/counters/jobs", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "NOT_FOUND");
}

#[tokio::test]
async fn ops_endpoints() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/healthz", None).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ok"));
    let (status, _) = call(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);

    call(&app, Method::POST, "/v1/counters/main/increment", None).await;
    let (status, body) = call(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"tally_ops_total{op="increment",outcome="ok"} 1"#), "{body}");
    assert!(body.contains("tally_counters 1"), "{body}");
    assert!(body.contains("tally_draining 0"), "{body}");
}

#[tokio::test]
async fn readyz_reports_draining() {
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let state = AppState::new(cfg).unwrap();
    let app = router::build_router(state.clone());

    state.set_draining();
    let (status, body) = call(&app, Method::GET, "/readyz", None).await;
    assert_eq!((status, body.as_str()), (StatusCode::SERVICE_UNAVAILABLE, "draining"));

    let (status, _) = call(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/metrics", None).await;
    assert!(body.contains("tally_draining 1"), "{body}");
}
