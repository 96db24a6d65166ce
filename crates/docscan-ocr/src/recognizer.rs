// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The "recognize text from image" capability, consumed once for the cloud
// backend and once for the on-device backend.

use std::path::Path;

use async_trait::async_trait;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::OcrSource;

/// Raw output of one recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    /// Extracted text, possibly empty.
    pub text: String,
    /// Backend-reported confidence in `0.0..=1.0`, if it reports one.
    pub confidence: Option<f32>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }

    /// Backend-reported confidence, or [`estimate_confidence`] when absent.
    pub fn confidence_or_estimate(&self) -> f32 {
        self.confidence
            .unwrap_or_else(|| estimate_confidence(&self.text))
    }
}

/// A text recognition backend.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Extract text from the image at `image`.
    async fn recognize(&self, image: &Path) -> Result<RecognizedText>;
}

/// Recognizer for a backend this build doesn't have. Always fails, so
/// arbitration falls through to whichever backend is available.
#[derive(Debug, Clone, Copy)]
pub struct UnavailableRecognizer {
    source: OcrSource,
}

impl UnavailableRecognizer {
    pub fn new(source: OcrSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Recognizer for UnavailableRecognizer {
    async fn recognize(&self, _image: &Path) -> Result<RecognizedText> {
        Err(DocscanError::recognition(
            self.source,
            DocscanError::PlatformUnavailable.to_string(),
        ))
    }
}

/// Heuristic confidence for backends that don't report one.
///
/// Based on output length, with a small bonus for multi-line text:
///
/// - 0 chars → 0.0
/// - 1–49 → 0.3
/// - 50–199 → 0.5
/// - 200+ → 0.7
///
/// Capped at 0.9.
pub fn estimate_confidence(text: &str) -> f32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let base: f32 = match trimmed.chars().count() {
        0..50 => 0.3,
        50..200 => 0.5,
        _ => 0.7,
    };
    let bonus = if trimmed.lines().count() > 3 { 0.1 } else { 0.0 };

    (base + bonus).min(0.9)
}
