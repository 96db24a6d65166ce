// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-device text recognition.
//
// Wraps the `ocrs` crate, a pure-Rust OCR engine backed by neural network
// models executed via `rten`. Only available with the `ocr` feature:
//
// ```toml
// docscan-ocr = { path = "crates/docscan-ocr", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions.
// - **Recognition model** (`text-recognition.rten`) — decodes characters.
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), which is the default model directory.
//
// Recognition is CPU-bound and runs on the blocking thread pool so it never
// stalls the event loop the cloud request is waiting on.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::OcrSource;
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::recognizer::{RecognizedText, Recognizer};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

fn fail(reason: impl Into<String>) -> DocscanError {
    DocscanError::recognition(OcrSource::OnDevice, reason)
}

/// Locations of the two model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl ModelPaths {
    /// Expects `text-detection.rten` and `text-recognition.rten` in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [("detection", &self.detection), ("recognition", &self.recognition)] {
            if !path.exists() {
                return Err(fail(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loaded `ocrs` engine. Model loading is the expensive step, so build one
/// and share it.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn load(paths: &ModelPaths) -> Result<Self> {
        paths.validate()?;

        let detection_model = Model::load_file(&paths.detection)
            .map_err(|e| fail(format!("failed to load detection model: {e}")))?;
        let recognition_model = Model::load_file(&paths.recognition)
            .map_err(|e| fail(format!("failed to load recognition model: {e}")))?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| fail(format!("failed to initialise OCR engine: {e}")))?;

        info!("on-device OCR engine initialised");
        Ok(Self { engine })
    }

    /// All text in `image`, lines separated by newlines.
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .map_err(|e| fail(format!("bad image source ({width}x{height}): {e}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| fail(format!("preprocessing failed: {e}")))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|e| fail(format!("recognition failed: {e}")))?;

        debug!(line_count = text.lines().count(), "on-device recognition complete");
        Ok(text)
    }
}

/// [`Recognizer`] running [`OcrEngine`] on the blocking pool.
#[derive(Clone)]
pub struct OnDeviceRecognizer {
    engine: Arc<OcrEngine>,
}

impl OnDeviceRecognizer {
    pub fn new(engine: OcrEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Load models from `dir`, or the default cache directory.
    pub fn from_model_dir(dir: Option<&Path>) -> Result<Self> {
        let paths = dir.map(ModelPaths::from_dir).unwrap_or_default();
        Ok(Self::new(OcrEngine::load(&paths)?))
    }
}

#[async_trait]
impl Recognizer for OnDeviceRecognizer {
    #[instrument(skip_all, fields(image = %image.display()))]
    async fn recognize(&self, image: &Path) -> Result<RecognizedText> {
        let engine = Arc::clone(&self.engine);
        let path = image.to_path_buf();
        let start = Instant::now();

        let text = tokio::task::spawn_blocking(move || {
            let decoded = image::open(&path)
                .map_err(|e| fail(format!("cannot decode {}: {e}", path.display())))?;
            engine.recognize_text(&decoded)
        })
        .await
        .map_err(|e| fail(format!("recognition task aborted: {e}")))??;

        info!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            "on-device recognition complete"
        );
        Ok(RecognizedText::new(text))
    }
}
