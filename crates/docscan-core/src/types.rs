// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Docscan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DocscanError, Result};

/// A saved document in the user's library.
///
/// Serialised with the camelCase field names used by the persisted index
/// (`name`, `pdfPath`, `imagePath`, `date`, `ocrText`). Optional fields are
/// omitted from the JSON when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Display name. User-editable, not unique.
    pub name: String,
    /// Location of the rendered PDF. Identifies the record for rename/remove.
    pub pdf_path: String,
    /// Location of the source image, if one was kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Creation time. Never changes after the record is created.
    pub date: DateTime<Utc>,
    /// Text extracted by OCR, once it has resolved successfully.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

impl DocumentRecord {
    /// New record stamped with the current time.
    pub fn new(name: impl Into<String>, pdf_path: impl Into<String>) -> Self {
        Self::created_at(name, pdf_path, Utc::now())
    }

    /// New record with an explicit creation time.
    pub fn created_at(
        name: impl Into<String>,
        pdf_path: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            pdf_path: pdf_path.into(),
            image_path: None,
            date,
            ocr_text: None,
        }
    }

    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    pub fn with_ocr_text(mut self, text: impl Into<String>) -> Self {
        self.ocr_text = Some(text.into());
        self
    }

    /// Check the persistence invariant: a record needs a name and a PDF path.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DocscanError::InvalidRecord("name is empty".into()));
        }
        if self.pdf_path.trim().is_empty() {
            return Err(DocscanError::InvalidRecord(format!(
                "record {:?} has an empty pdfPath",
                self.name
            )));
        }
        Ok(())
    }
}

/// Which recognizer produced an OCR result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrSource {
    /// Remote text-detection service.
    Cloud,
    /// Recognition on this device.
    OnDevice,
}

impl std::fmt::Display for OcrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloud => f.write_str("cloud"),
            Self::OnDevice => f.write_str("on-device"),
        }
    }
}

/// Text extracted from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    /// Extracted text, possibly empty.
    pub text: String,
    /// Quality estimate in `0.0..=1.0`. Not comparable across sources.
    pub confidence: f32,
    /// Diagnostics only.
    pub source: OcrSource,
}

impl OcrResult {
    /// Whether the recognizer found no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// OCR progress for one image, as shown to the user.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OcrStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Arbitration in flight.
    Processing,
    /// Arbitration resolved. The text may be empty.
    Success(OcrResult),
    /// Every recognizer failed.
    Failed(String),
}

impl OcrStatus {
    /// `Success` and `Failed` never change again for the same image.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }

    /// Extracted text, if OCR resolved successfully.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Success(result) => Some(&result.text),
            _ => None,
        }
    }
}

impl From<Result<OcrResult>> for OcrStatus {
    fn from(outcome: Result<OcrResult>) -> Self {
        match outcome {
            Ok(result) => Self::Success(result),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Standard paper sizes for generated PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}
