// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decoding and encoding of the stored document collection.
//
// The collection is one JSON array. Older writers used `path` for the PDF
// location; those entries are read as `pdfPath` and re-encoded in the
// canonical shape on the next write. Entries missing a name, a PDF path, or
// a parseable date are dropped.

use chrono::{DateTime, Utc};
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::DocumentRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Loose view of one stored entry. Every field is optional so that a bad
/// entry can be reported instead of failing the whole collection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    name: Option<String>,
    pdf_path: Option<String>,
    /// Legacy name for `pdfPath`.
    path: Option<String>,
    image_path: Option<String>,
    date: Option<String>,
    ocr_text: Option<String>,
}

/// Result of decoding a stored collection.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Valid records in stored order.
    pub records: Vec<DocumentRecord>,
    /// Entries that were read from the legacy `path` shape.
    pub migrated: usize,
    /// Entries that were rejected.
    pub dropped: usize,
}

impl Decoded {
    /// Whether writing `records` back would change the stored value.
    pub fn needs_rewrite(&self) -> bool {
        self.migrated > 0 || self.dropped > 0
    }
}

/// Decode the raw JSON collection.
///
/// Fails with [`DocscanError::CorruptIndex`] only if the value is not a JSON
/// array; individual bad entries are dropped and counted.
pub fn decode_collection(raw: &str) -> Result<Decoded> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DocscanError::CorruptIndex(format!("not valid JSON: {e}")))?;
    let Value::Array(entries) = value else {
        return Err(DocscanError::CorruptIndex(
            "stored collection is not a JSON array".into(),
        ));
    };

    let mut decoded = Decoded {
        records: Vec::with_capacity(entries.len()),
        ..Decoded::default()
    };

    for (position, entry) in entries.into_iter().enumerate() {
        match decode_entry(entry) {
            Ok((record, migrated)) => {
                if migrated {
                    decoded.migrated += 1;
                }
                decoded.records.push(record);
            }
            Err(reason) => {
                warn!(position, %reason, "dropping invalid document entry");
                decoded.dropped += 1;
            }
        }
    }

    Ok(decoded)
}

/// Decode one entry, reporting whether it used the legacy shape.
fn decode_entry(entry: Value) -> std::result::Result<(DocumentRecord, bool), String> {
    let stored: StoredRecord =
        serde_json::from_value(entry).map_err(|e| format!("malformed entry: {e}"))?;

    let name = stored.name.ok_or("missing name")?;
    let (pdf_path, migrated) = match (stored.pdf_path, stored.path) {
        (Some(pdf_path), legacy) => (pdf_path, legacy.is_some()),
        (None, Some(path)) => (path, true),
        (None, None) => return Err("missing pdfPath".into()),
    };
    let raw_date = stored.date.ok_or("missing date")?;
    let date = DateTime::parse_from_rfc3339(&raw_date)
        .map_err(|e| format!("unparseable date {raw_date:?}: {e}"))?
        .with_timezone(&Utc);

    let record = DocumentRecord {
        name,
        pdf_path,
        image_path: stored.image_path,
        date,
        ocr_text: stored.ocr_text,
    };
    record.validate().map_err(|e| e.to_string())?;

    Ok((record, migrated))
}

/// Encode records in the canonical shape.
pub fn encode_collection(records: &[DocumentRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}
