//! Wire-level tests for [`HttpOptimizer`] against a mock optimization service.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asset_optimizer::providers::http::{
    DETAILS_HEADER, QUALITY_HEADER, RESULT_HEADER, SECRET_HEADER, TYPE_HEADER, hash_secret,
};
use asset_optimizer::version::user_agent;
use asset_optimizer::{AssetType, HttpOptimizer, OptimizationResult, Optimizer};

const TIMEOUT: Duration = Duration::from_secs(5);

fn png() -> AssetType {
    AssetType::from_path(std::path::Path::new("a.png"), &["png".to_string()]).unwrap()
}

fn client(server: &MockServer) -> HttpOptimizer {
    HttpOptimizer::new(format!("{}/optimize", server.uri()), "s3cr3t", TIMEOUT).unwrap()
}

#[tokio::test]
async fn sends_hashed_secret_type_quality_and_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/optimize"))
        .and(header(SECRET_HEADER, hash_secret("s3cr3t").as_str()))
        .and(header(QUALITY_HEADER, "auto"))
        .and(header(TYPE_HEADER, "png"))
        .and(body_string_contains("name=\"content\""))
        .and(body_string_contains("original image bytes"))
        .and(header("user-agent", user_agent().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(RESULT_HEADER, "ok")
                .insert_header(DETAILS_HEADER, "saved 40%")
                .set_body_bytes(b"smaller".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"original image bytes".to_vec(), &png(), "auto")
        .await
        .unwrap();

    assert_eq!(response.result, OptimizationResult::Ok);
    assert_eq!(response.details, "saved 40%");
    assert_eq!(response.body, b"smaller");
    assert!(response.raw.starts_with("HTTP 200"));
    assert!(response.raw.contains("x-optimizer-result: ok"));
}

#[tokio::test]
async fn raw_secret_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(SECRET_HEADER, "s3cr3t"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).insert_header(RESULT_HEADER, "no-change"))
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap();
    assert_eq!(response.result, OptimizationResult::NoChange);
}

#[tokio::test]
async fn result_header_is_case_insensitive_and_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).insert_header(RESULT_HEADER, " No-Change "))
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap();
    assert_eq!(response.result, OptimizationResult::NoChange);
}

#[tokio::test]
async fn forbidden_verdict_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(RESULT_HEADER, "forbidden")
                .insert_header(DETAILS_HEADER, "invalid secret"),
        )
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap();
    assert_eq!(response.result, OptimizationResult::Forbidden);
    assert_eq!(response.details, "invalid secret");
}

#[tokio::test]
async fn missing_result_header_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap();
    assert!(matches!(response.result, OptimizationResult::Unknown(_)));
    assert!(response.raw.starts_with("HTTP 502"));
}

#[tokio::test]
async fn status_code_does_not_override_result_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header(RESULT_HEADER, "ok")
                .set_body_bytes(b"fine".to_vec()),
        )
        .mount(&server)
        .await;

    let response = client(&server)
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap();
    assert_eq!(response.result, OptimizationResult::Ok);
    assert_eq!(response.body, b"fine");
}

#[tokio::test]
async fn slow_service_times_out_as_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(RESULT_HEADER, "ok")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let optimizer = HttpOptimizer::new(server.uri(), "s3cr3t", Duration::from_millis(100)).unwrap();
    let err = optimizer
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn connection_refused_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let optimizer = HttpOptimizer::new(format!("http://{addr}/"), "s3cr3t", TIMEOUT).unwrap();
    let err = optimizer
        .optimize(b"x".to_vec(), &png(), "auto")
        .await
        .unwrap_err();
    assert!(err.is_transient());
}
