use api::app;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use rag_engine::{EngineConfig, ExtractionEngine};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "extraction-flow-test-boundary";

// These tests redirect TMPDIR to observe spool-file cleanup; the environment
// is process-global, so they take turns and restore it on the way out.
static ENV_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

struct TmpDirGuard {
    original: Option<std::ffi::OsString>,
}

impl TmpDirGuard {
    fn set(path: &Path) -> Self {
        let original = std::env::var_os("TMPDIR");
        std::env::set_var("TMPDIR", path);
        Self { original }
    }
}

impl Drop for TmpDirGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => std::env::set_var("TMPDIR", value),
            None => std::env::remove_var("TMPDIR"),
        }
    }
}

fn test_engine(base_url: &str) -> Arc<ExtractionEngine> {
    Arc::new(
        ExtractionEngine::new(EngineConfig {
            openai_api_key: "sk-test".to_string(),
            openai_base_url: base_url.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            chunk_size: 1024,
            chunk_overlap: 200,
            top_k: 5,
            max_context_tokens: 2800,
        })
        .unwrap(),
    )
}

fn upload_request(filename: &str, data: &[u8]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn contract_terms_completion() -> Value {
    let terms = json!({
        "rate": "$150 per hour",
        "deliverables": [
            { "deliverable": "Discovery report", "deadline": "March 31, 2024" },
            { "deliverable": "Implementation plan", "deadline": "April 30, 2024" },
            { "deliverable": "Final training workshop", "deadline": "May 15, 2024" }
        ],
        "paymentTimeline": "Invoices are payable within 30 days of receipt (net 30)."
    });
    json!({
        "choices": [
            { "message": { "role": "assistant", "content": terms.to_string() } }
        ]
    })
}

#[tokio::test]
async fn valid_pdf_yields_contract_terms_and_releases_the_spool_file() {
    let _env = ENV_LOCK.lock().await;
    let spool_dir = tempfile::tempdir().unwrap();
    let _tmpdir = TmpDirGuard::set(spool_dir.path());

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(contract_terms_completion());
        })
        .await;

    let app = app(test_engine(&server.base_url()));
    let pdf: &[u8] = include_bytes!("fixtures/contract.pdf");

    // Same PDF twice: the schema shape must be identical both times (values
    // can vary with a live model; the mock keeps this deterministic).
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(upload_request("contract.pdf", pdf))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        assert!(!body["rate"].as_str().unwrap().is_empty());
        let deliverables = body["deliverables"].as_array().unwrap();
        assert!(!deliverables.is_empty());
        for deliverable in deliverables {
            assert!(!deliverable["deliverable"].as_str().unwrap().is_empty());
            assert!(!deliverable["deadline"].as_str().unwrap().is_empty());
        }
        assert!(!body["paymentTimeline"].as_str().unwrap().is_empty());
    }

    assert!(mock.hits_async().await >= 2);

    // The per-request spool files must be gone once the responses are out.
    let leftovers: Vec<_> = std::fs::read_dir(spool_dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "spool files leaked: {:?}", leftovers);
}

#[tokio::test]
async fn unparseable_pdf_is_a_server_error_and_releases_the_spool_file() {
    let _env = ENV_LOCK.lock().await;
    let spool_dir = tempfile::tempdir().unwrap();
    let _tmpdir = TmpDirGuard::set(spool_dir.path());

    let server = MockServer::start_async().await;
    let app = app(test_engine(&server.base_url()));

    let response = app
        .oneshot(upload_request("contract.pdf", b"not really a pdf"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "internal server error");

    let leftovers: Vec<_> = std::fs::read_dir(spool_dir.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "spool files leaked: {:?}", leftovers);
}

#[tokio::test]
async fn pdf_without_extractable_text_still_completes_the_query() {
    let _env = ENV_LOCK.lock().await;
    let spool_dir = tempfile::tempdir().unwrap();
    let _tmpdir = TmpDirGuard::set(spool_dir.path());

    let server = MockServer::start_async().await;
    // A text-free document gives the model nothing to work with; the
    // templates still demand an answer, so an empty low-confidence result
    // comes back instead of an error.
    let empty_terms = json!({ "rate": "", "deliverables": [], "paymentTimeline": "" });
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": empty_terms.to_string() } }
                ]
            }));
        })
        .await;

    let app = app(test_engine(&server.base_url()));
    let pdf: &[u8] = include_bytes!("fixtures/blank.pdf");

    let response = app
        .oneshot(upload_request("blank.pdf", pdf))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body.get("rate").is_some());
    assert!(body.get("deliverables").is_some());
    assert!(body.get("paymentTimeline").is_some());
}
