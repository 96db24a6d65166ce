// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-ocr — text recognition for scanned pages.
//
// A cloud recognizer and an on-device recognizer sit behind one
// `Recognizer` trait. `OcrArbitrator` races them (cloud first, on-device
// after a fixed delay, first success wins) and `OcrTracker` exposes the
// per-image status the UI shows.

pub mod arbitrator;
pub mod cloud;
pub mod recognizer;
pub mod tracker;

#[cfg(feature = "ocr")]
pub mod local;

use std::path::Path;
use std::sync::Arc;

use docscan_core::error::Result;

pub use arbitrator::OcrArbitrator;
pub use cloud::CloudVisionRecognizer;
pub use recognizer::{RecognizedText, Recognizer, UnavailableRecognizer};
pub use tracker::OcrTracker;

#[cfg(feature = "ocr")]
pub use local::OnDeviceRecognizer;

/// Build the on-device recognizer for this build.
///
/// With the `ocr` feature this loads the `ocrs` models from `model_dir` (or
/// the default cache directory). Without it, returns a recognizer that always
/// fails so arbitration relies on the cloud alone.
pub fn on_device_recognizer(model_dir: Option<&Path>) -> Result<Arc<dyn Recognizer>> {
    #[cfg(feature = "ocr")]
    {
        Ok(Arc::new(local::OnDeviceRecognizer::from_model_dir(model_dir)?))
    }
    #[cfg(not(feature = "ocr"))]
    {
        let _ = model_dir;
        Ok(Arc::new(UnavailableRecognizer::new(
            docscan_core::types::OcrSource::OnDevice,
        )))
    }
}
