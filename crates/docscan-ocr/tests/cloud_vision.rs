// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cloud recognizer against a mock text-detection endpoint, alone and inside
// the arbitrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use docscan_core::error::Result;
use docscan_core::types::OcrSource;
use docscan_ocr::{
    CloudVisionRecognizer, OcrArbitrator, RecognizedText, Recognizer, UnavailableRecognizer,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0 not really a jpeg";

fn write_image() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("page.jpg");
    std::fs::write(&image, IMAGE_BYTES).expect("write image");
    (dir, image)
}

/// On-device stand-in that always reads the same text.
struct DeviceText(&'static str);

#[async_trait]
impl Recognizer for DeviceText {
    async fn recognize(&self, _image: &Path) -> Result<RecognizedText> {
        Ok(RecognizedText::new(self.0))
    }
}

fn recognizer(server: &MockServer, api_key: Option<&str>) -> CloudVisionRecognizer {
    CloudVisionRecognizer::new(
        format!("{}/v1/images:annotate", server.uri()),
        api_key.map(str::to_owned),
        Duration::from_secs(5),
    )
    .expect("client")
}

#[tokio::test]
async fn sends_base64_image_and_reads_full_text() {
    let server = MockServer::start().await;
    let expected_content = base64::engine::general_purpose::STANDARD.encode(IMAGE_BYTES);

    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "requests": [{
                "image": { "content": expected_content },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{
                "textAnnotations": [
                    { "description": "INVOICE\nTotal 42.00" },
                    { "description": "INVOICE" }
                ],
                "fullTextAnnotation": { "pages": [{ "confidence": 0.93 }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, image) = write_image();
    let found = recognizer(&server, Some("test-key"))
        .recognize(&image)
        .await
        .expect("recognized");

    assert_eq!(found.text, "INVOICE\nTotal 42.00");
    assert_eq!(found.confidence, Some(0.93));
}

#[tokio::test]
async fn empty_annotations_are_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [{}] })))
        .mount(&server)
        .await;

    let (_dir, image) = write_image();
    let err = recognizer(&server, Some("k"))
        .recognize(&image)
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("no text annotations"));
}

#[tokio::test]
async fn http_error_status_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let (_dir, image) = write_image();
    let err = recognizer(&server, Some("k"))
        .recognize(&image)
        .await
        .expect_err("must fail");
    let msg = err.to_string();
    assert!(msg.contains("429"));
    assert!(msg.contains("quota exceeded"));
}

#[tokio::test]
async fn missing_api_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, image) = write_image();
    let err = recognizer(&server, None)
        .recognize(&image)
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("API key"));
}

#[tokio::test]
async fn unreadable_image_is_a_failure() {
    let server = MockServer::start().await;
    let err = recognizer(&server, Some("k"))
        .recognize(&PathBuf::from("/nonexistent/page.jpg"))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("cannot read"));
}

#[tokio::test]
async fn slow_service_trips_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "responses": [{ "textAnnotations": [{ "description": "late" }] }] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let cloud = CloudVisionRecognizer::new(
        format!("{}/v1/images:annotate", server.uri()),
        Some("k".into()),
        Duration::from_millis(200),
    )
    .expect("client");

    let (_dir, image) = write_image();
    let err = cloud.recognize(&image).await.expect_err("must time out");
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn arbitrator_returns_cloud_result_when_service_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "textAnnotations": [{ "description": "Receipt" }] }]
        })))
        .mount(&server)
        .await;

    let arbitrator = OcrArbitrator::new(
        Arc::new(recognizer(&server, Some("k"))),
        Arc::new(UnavailableRecognizer::new(OcrSource::OnDevice)),
    );

    let (_dir, image) = write_image();
    let result = arbitrator.recognize(&image).await.expect("success");
    assert_eq!(result.source, OcrSource::Cloud);
    assert_eq!(result.text, "Receipt");
    assert!(result.confidence > 0.0);
}

#[tokio::test]
async fn arbitrator_fails_when_cloud_is_empty_and_device_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [{}] })))
        .mount(&server)
        .await;

    let arbitrator = OcrArbitrator::new(
        Arc::new(recognizer(&server, Some("k"))),
        Arc::new(UnavailableRecognizer::new(OcrSource::OnDevice)),
    )
    .with_fallback_delay(Duration::from_millis(50));

    let (_dir, image) = write_image();
    let err = arbitrator.recognize(&image).await.expect_err("must fail");
    assert!(err.to_string().contains("no text annotations"));
}

#[tokio::test]
async fn arbitrator_falls_back_to_device_when_cloud_finds_no_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [{}] })))
        .expect(1)
        .mount(&server)
        .await;

    let arbitrator = OcrArbitrator::new(
        Arc::new(recognizer(&server, Some("k"))),
        Arc::new(DeviceText("printed on device")),
    )
    .with_fallback_delay(Duration::from_millis(50));

    let (_dir, image) = write_image();
    let result = arbitrator.recognize(&image).await.expect("success");
    assert_eq!(result.source, OcrSource::OnDevice);
    assert_eq!(result.text, "printed on device");
}
