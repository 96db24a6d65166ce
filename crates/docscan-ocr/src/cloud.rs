// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cloud text recognition via a Vision-style `images:annotate` endpoint.
//
// The image is sent base64-encoded with a single TEXT_DETECTION feature. The
// first text annotation holds the full detected text. A response with no text
// annotations is reported as a failure so that arbitration falls back to the
// on-device recognizer.

use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use docscan_core::config::OcrSettings;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::OcrSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::recognizer::{RecognizedText, Recognizer};

/// Longest slice of an error body included in a failure message.
const MAX_ERROR_BODY: usize = 512;

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    full_text_annotation: Option<FullTextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    pages: Vec<PageAnnotation>,
}

#[derive(Debug, Deserialize)]
struct PageAnnotation {
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

// ──────────────────────────────────────────────
// CloudVisionRecognizer
// ──────────────────────────────────────────────

/// Recognizer backed by a remote text-detection service.
pub struct CloudVisionRecognizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl CloudVisionRecognizer {
    /// Build a recognizer whose requests time out after `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocscanError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_settings(settings: &OcrSettings) -> Result<Self> {
        Self::new(
            settings.cloud_endpoint.clone(),
            settings.cloud_api_key.clone(),
            settings.cloud_timeout(),
        )
    }

    fn fail(reason: impl Into<String>) -> DocscanError {
        DocscanError::recognition(OcrSource::Cloud, reason)
    }
}

#[async_trait]
impl Recognizer for CloudVisionRecognizer {
    #[instrument(skip_all, fields(image = %image.display()))]
    async fn recognize(&self, image: &Path) -> Result<RecognizedText> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Self::fail("no API key configured"))?;

        let bytes = tokio::fs::read(image)
            .await
            .map_err(|e| Self::fail(format!("cannot read {}: {e}", image.display())))?;
        let start = Instant::now();

        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(&bytes),
                },
                features: vec![Feature {
                    kind: "TEXT_DETECTION",
                }],
            }],
        };
        debug!(image_size = bytes.len(), "sending text detection request");

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Self::fail("request timed out")
                } else {
                    Self::fail(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(MAX_ERROR_BODY).collect();
            return Err(Self::fail(format!("HTTP {status}: {detail}")));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| Self::fail(format!("malformed response: {e}")))?;
        let found = extract_text(parsed)?;

        info!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = found.text.len(),
            confidence = ?found.confidence,
            "cloud recognition complete"
        );
        Ok(found)
    }
}

/// Pull the full text and page confidence out of a parsed response.
fn extract_text(parsed: AnnotateResponse) -> Result<RecognizedText> {
    let first = parsed
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| CloudVisionRecognizer::fail("empty response"))?;

    if let Some(err) = first.error {
        return Err(CloudVisionRecognizer::fail(format!(
            "service error {}: {}",
            err.code, err.message
        )));
    }

    let text = first
        .text_annotations
        .into_iter()
        .next()
        .map(|annotation| annotation.description)
        .ok_or_else(|| CloudVisionRecognizer::fail("no text annotations in response"))?;

    let confidences: Vec<f32> = first
        .full_text_annotation
        .map(|full| full.pages.into_iter().filter_map(|p| p.confidence).collect())
        .unwrap_or_default();
    let confidence = if confidences.is_empty() {
        None
    } else {
        Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
    };

    Ok(RecognizedText { text, confidence })
}
