// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — wires the document index, the OCR arbitrator and
// the PDF writer together behind the operations the CLI exposes.
//
// The index store is opened once at startup. When the database cannot be
// opened the service keeps running on an in-memory store so a broken data
// directory degrades to a session-only index instead of a crash.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use docscan_core::AppConfig;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::{DocumentRecord, OcrSource, OcrStatus};
use docscan_document::{PdfWriter, content_file_name};
use docscan_index::{DocumentIndex, KeyValueStore, MemoryStore, NormalizeReport, SqliteStore};
use docscan_ocr::{
    CloudVisionRecognizer, OcrArbitrator, OcrTracker, Recognizer, UnavailableRecognizer,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

const CONFIG_FILE: &str = "config.json";
const DOCUMENTS_DIR: &str = "documents";

/// Outcome of [`ScanService::save_scan`].
#[derive(Debug)]
pub struct SavedScan {
    /// The record as appended to the index.
    pub record: DocumentRecord,
    /// OCR status when the grace period ended.
    pub ocr: OcrStatus,
    pending: Option<JoinHandle<OcrStatus>>,
}

impl SavedScan {
    /// Whether OCR was still running when the record was saved.
    pub fn ocr_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for OCR that outlived the grace period.
    ///
    /// The background task attaches the text to the saved record on its own;
    /// this only waits for it and returns the final status.
    pub async fn wait_for_ocr(mut self) -> OcrStatus {
        match self.pending.take() {
            Some(handle) => handle
                .await
                .unwrap_or_else(|e| OcrStatus::Failed(format!("OCR task aborted: {e}"))),
            None => self.ocr,
        }
    }
}

/// Shared application services.
///
/// All fields are cheaply cloneable so the service can be moved into spawned
/// tasks.
#[derive(Clone)]
pub struct ScanService {
    index: DocumentIndex,
    arbitrator: OcrArbitrator,
    tracker: OcrTracker,
    data_dir: PathBuf,
    documents_dir: PathBuf,
    save_grace: Duration,
    config: AppConfig,
}

impl ScanService {
    /// Initialise all services. Call once at startup.
    ///
    /// Loads `config.json` from `data_dir`, opens the SQLite index and builds
    /// both recognizers. Missing on-device models are not fatal: arbitration
    /// then relies on the cloud alone.
    pub fn init(data_dir: PathBuf) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising services");
        let config = load_config(&data_dir).with_env_overrides();

        let db_path = data_dir.join(&config.store.database_file);
        let store: Arc<dyn KeyValueStore> = match SqliteStore::open(&db_path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(
                    path = %db_path.display(),
                    error = %e,
                    "persistent index unavailable, using in-memory store"
                );
                Arc::new(MemoryStore::new())
            }
        };

        let cloud: Arc<dyn Recognizer> =
            Arc::new(CloudVisionRecognizer::from_settings(&config.ocr)?);
        if config.ocr.cloud_api_key.is_none() {
            warn!("no cloud API key configured, cloud recognition will fail");
        }
        let on_device = match docscan_ocr::on_device_recognizer(config.ocr.model_dir.as_deref()) {
            Ok(recognizer) => recognizer,
            Err(e) => {
                warn!(error = %e, "on-device recognition unavailable");
                Arc::new(UnavailableRecognizer::new(OcrSource::OnDevice))
            }
        };
        let arbitrator = OcrArbitrator::from_settings(cloud, on_device, &config.ocr);

        Ok(Self::from_parts(data_dir, config, store, arbitrator))
    }

    /// Assemble a service from already-built parts.
    pub fn from_parts(
        data_dir: PathBuf,
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        arbitrator: OcrArbitrator,
    ) -> Self {
        let documents_dir = config
            .documents_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(DOCUMENTS_DIR));
        let index = DocumentIndex::with_key(store, config.store.index_key.clone());

        Self {
            index,
            arbitrator,
            tracker: OcrTracker::new(),
            data_dir,
            documents_dir,
            save_grace: config.ocr.save_grace(),
            config,
        }
    }

    /// How long [`save_scan`](Self::save_scan) waits for OCR before saving.
    pub fn with_save_grace(mut self, grace: Duration) -> Self {
        self.save_grace = grace;
        self
    }

    // -- Scanning ------------------------------------------------------------

    /// Save captured pages as a new document.
    ///
    /// Writes a copy of the first page and the PDF of all pages into the
    /// documents directory under content-hash names, runs OCR on the first
    /// page and waits up to the grace period for it. The record is then
    /// appended, carrying `ocrText` only if OCR already succeeded. If OCR is
    /// still running, it continues in the background and attaches its text
    /// to the record when it succeeds.
    ///
    /// Without a `name` the document is called `Scan_<n>`, `n` being one
    /// more than the number of saved documents.
    #[instrument(skip_all, fields(pages = images.len()))]
    pub async fn save_scan(&self, images: &[PathBuf], name: Option<&str>) -> Result<SavedScan> {
        let Some(first) = images.first() else {
            return Err(DocscanError::InvalidRecord(
                "a scan needs at least one page".into(),
            ));
        };

        let mut pages = Vec::with_capacity(images.len());
        for image in images {
            pages.push(tokio::fs::read(image).await?);
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_owned(),
            None => format!("Scan_{}", self.index.count()? + 1),
        };

        tokio::fs::create_dir_all(&self.documents_dir).await?;

        let extension = first
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "jpg".into());
        let image_path = self
            .documents_dir
            .join(content_file_name("page", &pages[0], &extension));
        tokio::fs::write(&image_path, &pages[0]).await?;

        let paper = self.config.default_paper_size;
        let title = name.clone();
        let pdf_bytes = tokio::task::spawn_blocking(move || {
            let mut writer = PdfWriter::new(paper);
            writer.set_title(title);
            writer.create_from_images(&pages)
        })
        .await
        .map_err(|e| DocscanError::PdfError(format!("PDF task aborted: {e}")))??;

        let pdf_path = self
            .documents_dir
            .join(content_file_name("scan", &pdf_bytes, "pdf"));
        tokio::fs::write(&pdf_path, &pdf_bytes).await?;

        let pdf_path = path_string(&pdf_path);
        let mut ocr_task = self.spawn_ocr(image_path.clone(), pdf_path.clone());
        let (ocr, pending) = match tokio::time::timeout(self.save_grace, &mut ocr_task).await {
            Ok(joined) => (
                joined.unwrap_or_else(|e| OcrStatus::Failed(format!("OCR task aborted: {e}"))),
                None,
            ),
            Err(_) => {
                debug!("OCR still running after grace period");
                (self.tracker.status(&image_path), Some(ocr_task))
            }
        };

        let mut record = DocumentRecord::new(name, pdf_path.clone())
            .with_image_path(path_string(&image_path));
        if let Some(text) = ocr.text() {
            record = record.with_ocr_text(text);
        }
        self.index.append(record.clone())?;

        // OCR may have settled between the grace timeout and the append, too
        // late for the record and too early for the background attach.
        let settled = self.tracker.status(&image_path);
        if pending.is_some()
            && let Some(text) = settled.text()
        {
            self.index.attach_ocr_text(&pdf_path, text)?;
        }

        info!(
            name = %record.name,
            pdf = %record.pdf_path,
            ocr_pending = pending.is_some(),
            "scan saved"
        );
        Ok(SavedScan {
            record,
            ocr,
            pending,
        })
    }

    /// Run OCR for `image` in the background, attaching any text to the
    /// record for `pdf_path` once it exists.
    fn spawn_ocr(&self, image: PathBuf, pdf_path: String) -> JoinHandle<OcrStatus> {
        let tracker = self.tracker.clone();
        let arbitrator = self.arbitrator.clone();
        let index = self.index.clone();
        tokio::spawn(async move {
            tracker.reset_if_settled(&image);
            let status = tracker.run(&arbitrator, &image).await;
            if let Some(text) = status.text() {
                match index.attach_ocr_text(&pdf_path, text) {
                    Ok(0) => {}
                    Ok(updated) => debug!(updated, "attached late OCR text"),
                    Err(e) => warn!(error = %e, "failed to attach OCR text"),
                }
            }
            status
        })
    }

    // -- OCR -----------------------------------------------------------------

    /// Recognise text in `image`.
    ///
    /// Each call is a fresh arbitration, except that an image whose OCR is
    /// still in flight reports `Processing` instead of starting a second one.
    pub async fn recognize(&self, image: &Path) -> OcrStatus {
        if self.tracker.reset_if_settled(image) {
            debug!(image = %image.display(), "retrying OCR");
        }
        self.tracker.run(&self.arbitrator, image).await
    }

    /// Run OCR for a saved document that has no text yet and attach the
    /// result.
    #[instrument(skip(self))]
    pub async fn recognize_document(&self, pdf_path: &str) -> Result<OcrStatus> {
        let record = self
            .index
            .list()?
            .into_iter()
            .find(|r| r.pdf_path == pdf_path)
            .ok_or_else(|| DocscanError::InvalidRecord(format!("no document at {pdf_path}")))?;
        let image = record.image_path.ok_or_else(|| {
            DocscanError::InvalidRecord(format!("document at {pdf_path} has no page image"))
        })?;

        let status = self.recognize(Path::new(&image)).await;
        if let Some(text) = status.text() {
            self.index.attach_ocr_text(pdf_path, text)?;
        }
        Ok(status)
    }

    // -- Document index ------------------------------------------------------

    pub fn list(&self) -> Result<Vec<DocumentRecord>> {
        self.index.list()
    }

    pub fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        self.index.find_by_name_contains(query)
    }

    pub fn rename(&self, pdf_path: &str, new_name: &str) -> Result<usize> {
        self.index.rename(pdf_path, new_name)
    }

    pub fn normalize(&self) -> Result<NormalizeReport> {
        self.index.normalize()
    }

    /// Remove the records for `pdf_path` and delete their files.
    ///
    /// File deletion is best effort: a file that is already gone or cannot
    /// be removed is logged and skipped. Files still referenced by another
    /// record are kept.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, pdf_path: &str) -> Result<Vec<DocumentRecord>> {
        let removed = self.index.remove(pdf_path)?;
        if removed.is_empty() {
            return Ok(removed);
        }

        let still_used: HashSet<String> = self
            .index
            .list()?
            .into_iter()
            .flat_map(|r| [Some(r.pdf_path), r.image_path])
            .flatten()
            .collect();

        for record in &removed {
            let files = std::iter::once(&record.pdf_path).chain(record.image_path.as_ref());
            for file in files {
                if !still_used.contains(file) {
                    remove_file_best_effort(Path::new(file)).await;
                }
            }
            if let Some(image) = &record.image_path {
                self.tracker.forget(Path::new(image));
            }
        }

        info!(removed = removed.len(), "document deleted");
        Ok(removed)
    }

    // -- Config persistence --------------------------------------------------

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Persist `config` to `config.json` in the data directory. Takes effect
    /// on the next start.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        persist_config(&self.data_dir, config)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "file already gone");
        }
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

// -- Config file persistence -------------------------------------------------

/// Config from `config.json`, or the defaults if it is missing or malformed.
pub fn load_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    let Ok(data) = std::fs::read_to_string(&path) else {
        return AppConfig::default();
    };
    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            AppConfig::default()
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
