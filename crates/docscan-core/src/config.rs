// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Key under which the document collection is stored.
pub const DEFAULT_INDEX_KEY: &str = "SAVED_PDFS";

/// Google Cloud Vision text-detection endpoint.
pub const DEFAULT_CLOUD_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Environment variable that overrides [`OcrSettings::cloud_api_key`].
pub const API_KEY_ENV: &str = "DOCSCAN_VISION_API_KEY";

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Paper size for generated PDFs.
    pub default_paper_size: crate::PaperSize,
    /// Where scanned PDFs and images are written. Defaults to
    /// `<data dir>/documents`.
    pub documents_dir: Option<PathBuf>,
    pub ocr: OcrSettings,
    pub store: StoreSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_paper_size: crate::PaperSize::A4,
            documents_dir: None,
            ocr: OcrSettings::default(),
            store: StoreSettings::default(),
        }
    }
}

impl AppConfig {
    /// Apply environment overrides on top of file-loaded settings.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            self.ocr.cloud_api_key = Some(key);
        }
        self
    }
}

/// OCR arbitration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Text-detection endpoint (POST).
    pub cloud_endpoint: String,
    /// API key sent as the `key` query parameter. Cloud OCR fails fast
    /// without one.
    pub cloud_api_key: Option<String>,
    /// Request timeout for the cloud call.
    pub cloud_timeout_secs: u64,
    /// Delay before on-device recognition starts.
    pub fallback_delay_secs: u64,
    /// How long saving a scan waits for OCR before storing it without text.
    pub save_grace_secs: u64,
    /// Directory holding the on-device detection/recognition models.
    pub model_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            cloud_endpoint: DEFAULT_CLOUD_ENDPOINT.to_owned(),
            cloud_api_key: None,
            cloud_timeout_secs: 30,
            fallback_delay_secs: 10,
            save_grace_secs: 15,
            model_dir: None,
        }
    }
}

impl OcrSettings {
    pub fn cloud_timeout(&self) -> Duration {
        Duration::from_secs(self.cloud_timeout_secs)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_secs(self.fallback_delay_secs)
    }

    pub fn save_grace(&self) -> Duration {
        Duration::from_secs(self.save_grace_secs)
    }
}

/// Document index persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite file name, relative to the data directory.
    pub database_file: String,
    /// Key holding the JSON array of records.
    pub index_key: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_file: "docscan.db".to_owned(),
            index_key: DEFAULT_INDEX_KEY.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ocr.fallback_delay(), Duration::from_secs(10));
        assert_eq!(config.store.index_key, "SAVED_PDFS");
        assert!(config.ocr.cloud_api_key.is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "ocr": { "cloud_timeout_secs": 5 } }"#).expect("parse");
        assert_eq!(config.ocr.cloud_timeout(), Duration::from_secs(5));
        assert_eq!(config.ocr.fallback_delay_secs, 10);
        assert_eq!(config.ocr.cloud_endpoint, DEFAULT_CLOUD_ENDPOINT);
        assert_eq!(config.store.database_file, "docscan.db");
    }
}
