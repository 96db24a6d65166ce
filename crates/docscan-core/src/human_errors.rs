// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for errors and OCR progress.
//
// Every technical error is mapped to plain English with a clear suggestion.
// OCR status gets its own notice type because "still processing", "failed",
// and "no text available" must stay distinguishable in the UI.

use crate::error::DocscanError;
use crate::types::OcrStatus;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout — trying again may work.
    Transient,
    /// User must do something (pick another file, add an API key).
    ActionRequired,
    /// Cannot be fixed by retrying or user action.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again could succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `DocscanError` into a `HumanError`.
pub fn humanize_error(err: &DocscanError) -> HumanError {
    match err {
        // -- Recognition --
        DocscanError::Recognition { reason, .. } => humanize_recognition(reason),

        DocscanError::OcrFailed { .. } => HumanError {
            message: "We couldn't read the text on this scan.".into(),
            suggestion: "Check your internet connection, or try scanning again with better lighting.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Index --
        DocscanError::Store(_) => HumanError {
            message: "Your document library couldn't be saved.".into(),
            suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocscanError::CorruptIndex(_) => HumanError {
            message: "Your document library is damaged.".into(),
            suggestion: "Your scanned files are still on the device. Run `docscan normalize` or restore the library from a backup.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        DocscanError::InvalidRecord(detail) => HumanError {
            message: "This document is missing some details.".into(),
            suggestion: format!("Give the document a name and try saving again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Documents --
        DocscanError::PdfError(_) => HumanError {
            message: "We couldn't create the PDF.".into(),
            suggestion: "Try scanning the pages again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocscanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        DocscanError::Config(detail) => HumanError {
            message: "The app's settings need attention.".into(),
            suggestion: format!("Check the settings file. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocscanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DocscanError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocscanError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "On-device text recognition needs a build with the `ocr` feature.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

/// Parse a single recognizer's failure reason.
fn humanize_recognition(reason: &str) -> HumanError {
    let lower = reason.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError {
            message: "Text recognition is taking too long.".into(),
            suggestion: "Your connection may be slow. We'll fall back to reading the text on this device.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("api key") {
        HumanError {
            message: "Cloud text recognition isn't set up.".into(),
            suggestion: format!("Set {} or add an API key to the settings file.", crate::config::API_KEY_ENV),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("model") {
        HumanError {
            message: "On-device text recognition isn't set up.".into(),
            suggestion: "Download the OCR models and point `model_dir` at them.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Text recognition didn't work on this scan.".into(),
            suggestion: format!("Try scanning the document again with better lighting. (Detail: {reason})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

/// What the UI shows for an image's OCR status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrNotice {
    /// Nothing to show yet.
    None,
    StillProcessing,
    Failed,
    NoTextAvailable,
    TextReady,
}

impl OcrNotice {
    pub fn for_status(status: &OcrStatus) -> Self {
        match status {
            OcrStatus::Idle => Self::None,
            OcrStatus::Processing => Self::StillProcessing,
            OcrStatus::Failed(_) => Self::Failed,
            OcrStatus::Success(result) if result.is_empty() => Self::NoTextAvailable,
            OcrStatus::Success(_) => Self::TextReady,
        }
    }

    /// Toast text, if the notice is shown at all.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::None | Self::TextReady => None,
            Self::StillProcessing => Some("Text recognition is still processing. Please wait."),
            Self::Failed => Some("Text recognition failed for this document."),
            Self::NoTextAvailable => Some("No text was found in this document."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OcrResult, OcrSource};

    #[test]
    fn cloud_timeout_is_transient() {
        let err = DocscanError::recognition("cloud", "request timed out after 30s");
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn missing_api_key_is_action_required() {
        let err = DocscanError::recognition("cloud", "no API key configured");
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn corrupt_index_is_permanent() {
        let human = humanize_error(&DocscanError::CorruptIndex("not an array".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }

    #[test]
    fn ocr_notices_stay_distinct() {
        let empty = OcrStatus::Success(OcrResult {
            text: "  ".into(),
            confidence: 0.0,
            source: OcrSource::OnDevice,
        });
        let full = OcrStatus::Success(OcrResult {
            text: "Invoice".into(),
            confidence: 0.9,
            source: OcrSource::Cloud,
        });

        let notices = [
            OcrNotice::for_status(&OcrStatus::Processing),
            OcrNotice::for_status(&OcrStatus::Failed("both failed".into())),
            OcrNotice::for_status(&empty),
        ];
        assert_eq!(
            notices,
            [
                OcrNotice::StillProcessing,
                OcrNotice::Failed,
                OcrNotice::NoTextAvailable
            ]
        );
        assert_ne!(notices[0].message(), notices[1].message());
        assert_ne!(notices[1].message(), notices[2].message());
        assert_eq!(OcrNotice::for_status(&full), OcrNotice::TextReady);
        assert_eq!(OcrNotice::for_status(&full).message(), None);
    }
}
