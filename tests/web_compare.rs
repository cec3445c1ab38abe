// Web surface tests. Run with `cargo test --features web`; the default
// `cargo test` skips this file.
//
// Requests go straight into the router via tower's oneshot; the oracle is an
// in-process double, so no sockets or network are involved.

#![cfg(feature = "web")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use comment_matcher::error::OracleError;
use comment_matcher::oracle::SimilarityOracle;
use comment_matcher::web::{build_router, AppState};

const BOUNDARY: &str = "matcher-test-boundary";

struct ConstantOracle;

#[async_trait]
impl SimilarityOracle for ConstantOracle {
    async fn complete(&self, _prompt: &str) -> Result<String, OracleError> {
        Ok("70".to_string())
    }
}

fn state() -> AppState {
    AppState {
        oracle: Arc::new(ConstantOracle),
        concurrency: 2,
    }
}

/// Build a multipart body from (field name, file name, contents).
fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
    let mut body = String::new();
    for (field, file_name, contents) in parts {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

fn upload(parts: &[(&str, &str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/compare")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let response = build_router(state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn index_serves_upload_form() {
    let response = build_router(state())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("name=\"sheet1\""));
    assert!(html.contains("name=\"sheet2\""));
}

#[tokio::test]
async fn compare_returns_workbook_attachment() {
    let response = build_router(state())
        .oneshot(upload(&[
            ("sheet1", "a.csv", "Comment\nRent\nInvoice"),
            ("sheet2", "b.csv", "Comment\nRent March"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("comparison_results.xlsx"));
    assert_eq!(response.headers()["x-flagged-pairs"], "2");
    assert_eq!(response.headers()["x-failed-pairs"], "0");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn missing_comment_column_is_bad_request() {
    let response = build_router(state())
        .oneshot(upload(&[
            ("sheet1", "a.csv", "Comment\nRent"),
            ("sheet2", "b.csv", "Notes\nRent"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("Comment"));
}

#[tokio::test]
async fn missing_second_sheet_is_bad_request() {
    let response = build_router(state())
        .oneshot(upload(&[("sheet1", "a.csv", "Comment\nRent")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
