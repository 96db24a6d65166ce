// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docscan.

use thiserror::Error;

/// Top-level error type for all Docscan operations.
#[derive(Debug, Error)]
pub enum DocscanError {
    // -- Recognition errors --
    /// A single recognizer (cloud or on-device) failed.
    #[error("{backend} recognition failed: {reason}")]
    Recognition { backend: String, reason: String },

    /// Every recognizer failed; carries the reasons in the order they arrived.
    #[error("OCR failed: {}", .reasons.join("; "))]
    OcrFailed { reasons: Vec<String> },

    // -- Document index errors --
    #[error("key-value store error: {0}")]
    Store(String),

    #[error("document index is corrupt: {0}")]
    CorruptIndex(String),

    #[error("invalid document record: {0}")]
    InvalidRecord(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl DocscanError {
    /// Shorthand for a backend-tagged [`DocscanError::Recognition`].
    pub fn recognition(backend: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self::Recognition {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocscanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregated_failure_lists_every_reason() {
        let err = DocscanError::OcrFailed {
            reasons: vec![
                "cloud recognition failed: quota exceeded".into(),
                "on-device recognition failed: models missing".into(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("quota exceeded"));
        assert!(msg.contains("models missing"));
    }

    #[test]
    fn recognition_shorthand_tags_backend() {
        let err = DocscanError::recognition("cloud", "HTTP 503");
        assert_eq!(err.to_string(), "cloud recognition failed: HTTP 503");
    }
}
