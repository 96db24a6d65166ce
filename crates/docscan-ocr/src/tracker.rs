// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-image OCR status for the UI: idle → processing → success | failed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use docscan_core::error::Result;
use docscan_core::types::{OcrResult, OcrStatus};
use tracing::debug;

use crate::arbitrator::OcrArbitrator;

/// Shared table of OCR statuses keyed by image path.
///
/// Terminal statuses are final: once an image is `Success` or `Failed`, no
/// later result can replace it and it cannot go back to `Processing`. Call
/// [`forget`](Self::forget) to start over for that image.
#[derive(Debug, Clone, Default)]
pub struct OcrTracker {
    statuses: Arc<Mutex<HashMap<PathBuf, OcrStatus>>>,
}

impl OcrTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<PathBuf, OcrStatus>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current status, `Idle` if the image was never submitted.
    pub fn status(&self, image: &Path) -> OcrStatus {
        self.table().get(image).cloned().unwrap_or_default()
    }

    /// Move `image` from idle to processing. Returns `false` if it is already
    /// processing or finished.
    pub fn begin(&self, image: &Path) -> bool {
        let mut table = self.table();
        match table.get(image) {
            None | Some(OcrStatus::Idle) => {
                table.insert(image.to_path_buf(), OcrStatus::Processing);
                true
            }
            Some(_) => false,
        }
    }

    /// Record the outcome for `image`. Returns `false`, leaving the status
    /// alone, unless the image is currently processing.
    pub fn finish(&self, image: &Path, outcome: Result<OcrResult>) -> bool {
        let mut table = self.table();
        match table.get_mut(image) {
            Some(status @ OcrStatus::Processing) => {
                *status = OcrStatus::from(outcome);
                true
            }
            _ => {
                debug!(image = %image.display(), "discarding OCR outcome for settled image");
                false
            }
        }
    }

    /// Drop whatever is known about `image`.
    pub fn forget(&self, image: &Path) {
        self.table().remove(image);
    }

    /// Clear a finished status so the next [`run`](Self::run) arbitrates
    /// again. An image still processing is left alone. Returns `true` if a
    /// status was cleared.
    pub fn reset_if_settled(&self, image: &Path) -> bool {
        let mut table = self.table();
        if table.get(image).is_some_and(OcrStatus::is_terminal) {
            table.remove(image);
            true
        } else {
            false
        }
    }

    /// Run arbitration for `image` and record the outcome.
    ///
    /// If the image is already processing or finished, returns the current
    /// status without starting another arbitration.
    pub async fn run(&self, arbitrator: &OcrArbitrator, image: &Path) -> OcrStatus {
        if !self.begin(image) {
            return self.status(image);
        }
        let outcome = arbitrator.recognize(image).await;
        self.finish(image, outcome);
        self.status(image)
    }
}
