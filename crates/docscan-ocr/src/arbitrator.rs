// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR arbitration — race the cloud recognizer against a delayed on-device
// recognizer and keep the first success.
//
// Timeline for one image:
//
//   t = 0      cloud request starts (bounded by `cloud_timeout`)
//   t = delay  on-device recognition starts, unless the race is already won
//
// Each attempt runs in its own task and reports into a channel. The first
// `Ok` settles the race and drops the receiver; a loser that finishes later
// finds the channel closed and its result is discarded. A cloud failure
// inside the delay window does not end the race — the on-device attempt is
// still awaited. Only when both attempts fail does arbitration fail.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docscan_core::config::OcrSettings;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::{OcrResult, OcrSource};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::recognizer::{RecognizedText, Recognizer};

/// Default delay before the on-device attempt starts.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_secs(10);

/// Default bound on the cloud request.
pub const DEFAULT_CLOUD_TIMEOUT: Duration = Duration::from_secs(30);

type Attempt = (OcrSource, Result<RecognizedText>);

/// First-success-wins race between a cloud and an on-device recognizer.
#[derive(Clone)]
pub struct OcrArbitrator {
    cloud: Arc<dyn Recognizer>,
    on_device: Arc<dyn Recognizer>,
    fallback_delay: Duration,
    cloud_timeout: Duration,
}

impl OcrArbitrator {
    pub fn new(cloud: Arc<dyn Recognizer>, on_device: Arc<dyn Recognizer>) -> Self {
        Self {
            cloud,
            on_device,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
            cloud_timeout: DEFAULT_CLOUD_TIMEOUT,
        }
    }

    pub fn from_settings(
        cloud: Arc<dyn Recognizer>,
        on_device: Arc<dyn Recognizer>,
        settings: &OcrSettings,
    ) -> Self {
        Self::new(cloud, on_device)
            .with_fallback_delay(settings.fallback_delay())
            .with_cloud_timeout(settings.cloud_timeout())
    }

    pub fn with_fallback_delay(mut self, delay: Duration) -> Self {
        self.fallback_delay = delay;
        self
    }

    pub fn with_cloud_timeout(mut self, timeout: Duration) -> Self {
        self.cloud_timeout = timeout;
        self
    }

    /// Extract text from `image`.
    ///
    /// Returns the first successful result, whichever backend produced it.
    /// An empty text from the winner is still a success. Fails with
    /// [`DocscanError::OcrFailed`] only once both attempts have failed.
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(image = %image.as_ref().display()))]
    pub async fn recognize(&self, image: impl AsRef<Path>) -> Result<OcrResult> {
        let image = image.as_ref().to_path_buf();
        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<Attempt>(2);

        {
            let cloud = Arc::clone(&self.cloud);
            let tx = tx.clone();
            let image = image.clone();
            let timeout = self.cloud_timeout;
            tokio::spawn(async move {
                let outcome = match tokio::time::timeout(timeout, cloud.recognize(&image)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(DocscanError::recognition(
                        OcrSource::Cloud,
                        format!("request timed out after {}s", timeout.as_secs()),
                    )),
                };
                // Err means the race is settled and nobody is listening.
                let _ = tx.send((OcrSource::Cloud, outcome)).await;
            });
        }

        {
            let on_device = Arc::clone(&self.on_device);
            let delay = self.fallback_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if tx.is_closed() {
                    debug!("race settled before on-device recognition started");
                    return;
                }
                debug!("starting on-device recognition");
                let outcome = on_device.recognize(&image).await;
                let _ = tx.send((OcrSource::OnDevice, outcome)).await;
            });
        }

        let mut reasons = Vec::with_capacity(2);
        while let Some((source, outcome)) = rx.recv().await {
            match outcome {
                Ok(found) => {
                    let result = OcrResult {
                        confidence: found.confidence_or_estimate(),
                        text: found.text,
                        source,
                    };
                    info!(
                        %source,
                        elapsed_ms = %started.elapsed().as_millis(),
                        text_len = result.text.len(),
                        confidence = result.confidence,
                        "OCR resolved"
                    );
                    return Ok(result);
                }
                Err(err) => {
                    warn!(%source, error = %err, "recognizer failed");
                    reasons.push(err.to_string());
                }
            }
        }

        if reasons.len() < 2 {
            reasons.push("a recognizer stopped without reporting a result".into());
        }
        warn!(
            elapsed_ms = %started.elapsed().as_millis(),
            "every recognizer failed"
        );
        Err(DocscanError::OcrFailed { reasons })
    }
}
