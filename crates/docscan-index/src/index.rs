// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document index — the user's saved documents as one ordered collection.
//
// Every mutation reads the whole collection, transforms it in memory, and
// writes the whole collection back. There is no locking across that cycle:
// two overlapping mutations can lose an update (the last write wins on the
// whole collection). Callers sharing an index between tasks accept that.

use std::sync::Arc;

use docscan_core::config::DEFAULT_INDEX_KEY;
use docscan_core::error::{DocscanError, Result};
use docscan_core::types::DocumentRecord;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::schema::{decode_collection, encode_collection};
use crate::store::KeyValueStore;

/// Outcome of [`DocumentIndex::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    /// Records kept.
    pub records: usize,
    /// Legacy-shape entries rewritten.
    pub migrated: usize,
    /// Invalid entries removed.
    pub dropped: usize,
}

/// Append/list/search/rename/remove over the persisted document collection.
#[derive(Clone)]
pub struct DocumentIndex {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl DocumentIndex {
    /// Index stored under the default `SAVED_PDFS` key.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_INDEX_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Key the collection is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn load(&self) -> Result<Vec<DocumentRecord>> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(decode_collection(&raw)?.records),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, records: &[DocumentRecord]) -> Result<()> {
        let encoded = encode_collection(records)?;
        self.store.set(&self.key, &encoded)?;
        debug!(records = records.len(), "document collection written");
        Ok(())
    }

    /// Add a record to the end of the collection.
    ///
    /// On error nothing was saved.
    #[instrument(skip(self, record), fields(name = %record.name, pdf_path = %record.pdf_path))]
    pub fn append(&self, record: DocumentRecord) -> Result<()> {
        record.validate()?;

        let mut records = self.load()?;
        records.push(record);
        self.save(&records)?;

        info!(records = records.len(), "document appended");
        Ok(())
    }

    /// Every record in insertion order. Empty if nothing was ever saved.
    pub fn list(&self) -> Result<Vec<DocumentRecord>> {
        self.load()
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Records whose name contains `query`, ignoring case. The empty query
    /// matches everything.
    pub fn find_by_name_contains(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let needle = query.to_lowercase();
        Ok(self
            .load()?
            .into_iter()
            .filter(|record| record.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Rename every record whose PDF path is `pdf_path`.
    ///
    /// Returns how many records were renamed. Zero matches is not an error and
    /// leaves the store untouched.
    #[instrument(skip(self))]
    pub fn rename(&self, pdf_path: &str, new_name: &str) -> Result<usize> {
        if new_name.trim().is_empty() {
            return Err(DocscanError::InvalidRecord("new name is empty".into()));
        }

        let mut records = self.load()?;
        let mut renamed = 0;
        for record in records.iter_mut().filter(|r| r.pdf_path == pdf_path) {
            record.name = new_name.to_owned();
            renamed += 1;
        }

        if renamed > 0 {
            self.save(&records)?;
            info!(renamed, "document renamed");
        } else {
            debug!("rename matched no document");
        }
        Ok(renamed)
    }

    /// Remove every record whose PDF path is `pdf_path`.
    ///
    /// Returns the removed records so the caller can clean up their files.
    /// Zero matches is not an error and leaves the store untouched.
    #[instrument(skip(self))]
    pub fn remove(&self, pdf_path: &str) -> Result<Vec<DocumentRecord>> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .load()?
            .into_iter()
            .partition(|record| record.pdf_path == pdf_path);

        if !removed.is_empty() {
            self.save(&kept)?;
            info!(removed = removed.len(), remaining = kept.len(), "document removed");
        } else {
            debug!("remove matched no document");
        }
        Ok(removed)
    }

    /// Set `ocrText` on matching records that don't have any yet.
    ///
    /// Text that is already present is never overwritten, so a stale OCR
    /// result arriving late can't replace one that was saved first.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn attach_ocr_text(&self, pdf_path: &str, text: &str) -> Result<usize> {
        let mut records = self.load()?;
        let mut updated = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.pdf_path == pdf_path && r.ocr_text.is_none())
        {
            record.ocr_text = Some(text.to_owned());
            updated += 1;
        }

        if updated > 0 {
            self.save(&records)?;
            info!(updated, "OCR text attached");
        }
        Ok(updated)
    }

    /// Rewrite the stored collection in the canonical shape, dropping invalid
    /// entries. Writes only when something changed.
    #[instrument(skip(self))]
    pub fn normalize(&self) -> Result<NormalizeReport> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(NormalizeReport {
                records: 0,
                migrated: 0,
                dropped: 0,
            });
        };

        let decoded = decode_collection(&raw)?;
        if decoded.needs_rewrite() {
            self.save(&decoded.records)?;
        }

        let report = NormalizeReport {
            records: decoded.records.len(),
            migrated: decoded.migrated,
            dropped: decoded.dropped,
        };
        info!(?report, "document collection normalised");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::store::MemoryStore;

    /// Memory store that counts writes and can be told to fail them.
    #[derive(Default)]
    struct ProbeStore {
        inner: MemoryStore,
        writes: AtomicUsize,
        fail_writes: bool,
    }

    impl KeyValueStore for ProbeStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(DocscanError::Store("disk full".into()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }
    }

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().expect("valid timestamp")
    }

    fn scan_1() -> DocumentRecord {
        DocumentRecord::created_at("Scan_1", "/a.pdf", at("2024-01-01T00:00:00Z"))
    }

    fn scan_2() -> DocumentRecord {
        DocumentRecord::created_at("Scan_2", "/b.pdf", at("2024-01-02T00:00:00Z"))
    }

    fn index() -> (DocumentIndex, Arc<ProbeStore>) {
        let store = Arc::new(ProbeStore::default());
        (DocumentIndex::new(store.clone()), store)
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (index, _) = index();
        assert!(index.list().expect("list").is_empty());
        assert_eq!(index.count().expect("count"), 0);
    }

    #[test]
    fn append_then_list_round_trips_every_field() {
        let (index, _) = index();
        let record = scan_1().with_image_path("/a.jpg").with_ocr_text("Total: 42");

        index.append(record.clone()).expect("append");
        assert_eq!(index.list().expect("list"), vec![record]);
    }

    #[test]
    fn appends_keep_insertion_order() {
        let (index, _) = index();
        let names: Vec<String> = (1..=5).map(|n| format!("Scan_{n}")).collect();
        for (n, name) in names.iter().enumerate() {
            index
                .append(DocumentRecord::new(name.clone(), format!("/{n}.pdf")))
                .expect("append");
        }

        let listed: Vec<String> = index
            .list()
            .expect("list")
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn search_is_case_insensitive_and_ordered() {
        let (index, _) = index();
        index.append(scan_1()).expect("append");
        index.append(scan_2()).expect("append");

        let hits = index.find_by_name_contains("scan").expect("search");
        assert_eq!(hits, vec![scan_1(), scan_2()]);

        let hits = index.find_by_name_contains("_2").expect("search");
        assert_eq!(hits, vec![scan_2()]);
    }

    #[test]
    fn search_edge_queries_do_not_fail() {
        let (index, _) = index();
        index.append(scan_1()).expect("append");

        assert_eq!(index.find_by_name_contains("").expect("search").len(), 1);
        assert!(
            index
                .find_by_name_contains("nonexistent-substring-zzz")
                .expect("search")
                .is_empty()
        );
    }

    #[test]
    fn rename_changes_only_the_matching_record() {
        let (index, _) = index();
        index.append(scan_1()).expect("append");
        index.append(scan_2()).expect("append");

        assert_eq!(index.rename("/a.pdf", "Renamed").expect("rename"), 1);

        let listed = index.list().expect("list");
        assert_eq!(listed[0].name, "Renamed");
        assert_eq!(listed[0].date, scan_1().date);
        assert_eq!(listed[1], scan_2());
    }

    #[test]
    fn rename_missing_path_is_silent_no_op() {
        let (index, store) = index();
        index.append(scan_1()).expect("append");
        let before = index.list().expect("list");
        let writes = store.writes.load(Ordering::SeqCst);

        assert_eq!(index.rename("/missing.pdf", "X").expect("rename"), 0);
        assert_eq!(index.list().expect("list"), before);
        assert_eq!(store.writes.load(Ordering::SeqCst), writes);
    }

    #[test]
    fn rename_to_blank_is_rejected() {
        let (index, _) = index();
        index.append(scan_1()).expect("append");
        assert!(matches!(
            index.rename("/a.pdf", "   "),
            Err(DocscanError::InvalidRecord(_))
        ));
        assert_eq!(index.list().expect("list")[0].name, "Scan_1");
    }

    #[test]
    fn remove_deletes_every_match_and_is_idempotent() {
        let (index, store) = index();
        index.append(scan_1()).expect("append");
        index.append(scan_2()).expect("append");
        index
            .append(DocumentRecord::new("Scan_1 copy", "/a.pdf"))
            .expect("append");

        let removed = index.remove("/a.pdf").expect("remove");
        assert_eq!(removed.len(), 2);
        assert_eq!(index.list().expect("list"), vec![scan_2()]);

        let writes = store.writes.load(Ordering::SeqCst);
        assert!(index.remove("/a.pdf").expect("second remove").is_empty());
        assert_eq!(store.writes.load(Ordering::SeqCst), writes);
        assert_eq!(index.list().expect("list"), vec![scan_2()]);
    }

    #[test]
    fn failed_write_propagates_and_saves_nothing() {
        let store = Arc::new(ProbeStore {
            fail_writes: true,
            ..ProbeStore::default()
        });
        let index = DocumentIndex::new(store);

        assert!(matches!(
            index.append(scan_1()),
            Err(DocscanError::Store(_))
        ));
        assert!(index.list().expect("list").is_empty());
    }

    #[test]
    fn append_rejects_records_without_pdf_path() {
        let (index, store) = index();
        let record = DocumentRecord::new("Scan_1", "");
        assert!(matches!(
            index.append(record),
            Err(DocscanError::InvalidRecord(_))
        ));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn attach_ocr_text_is_set_once() {
        let (index, _) = index();
        index.append(scan_1()).expect("append");

        assert_eq!(index.attach_ocr_text("/a.pdf", "first").expect("attach"), 1);
        assert_eq!(index.attach_ocr_text("/a.pdf", "late").expect("attach"), 0);
        assert_eq!(index.attach_ocr_text("/none.pdf", "x").expect("attach"), 0);

        assert_eq!(
            index.list().expect("list")[0].ocr_text.as_deref(),
            Some("first")
        );
    }

    #[test]
    fn legacy_entries_are_read_and_normalised() {
        let (index, store) = index();
        store
            .set(
                "SAVED_PDFS",
                r#"[{"name":"Old","path":"/old.pdf","date":"2023-05-01T10:20:30Z"},{"name":"Broken"}]"#,
            )
            .expect("seed");

        let listed = index.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].pdf_path, "/old.pdf");

        let report = index.normalize().expect("normalize");
        assert_eq!(
            report,
            NormalizeReport {
                records: 1,
                migrated: 1,
                dropped: 1
            }
        );

        let raw = store.get("SAVED_PDFS").expect("get").expect("value");
        assert!(raw.contains("pdfPath"));
        assert!(!raw.contains("Broken"));

        let writes = store.writes.load(Ordering::SeqCst);
        index.normalize().expect("second normalize");
        assert_eq!(store.writes.load(Ordering::SeqCst), writes);
    }

    #[test]
    fn corrupt_collection_is_reported_not_overwritten() {
        let (index, store) = index();
        store.set("SAVED_PDFS", "{}").expect("seed");

        assert!(matches!(index.list(), Err(DocscanError::CorruptIndex(_))));
        assert!(matches!(
            index.append(scan_1()),
            Err(DocscanError::CorruptIndex(_))
        ));
        assert_eq!(store.get("SAVED_PDFS").expect("get").as_deref(), Some("{}"));
    }

    #[test]
    fn custom_key_is_isolated() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let main = DocumentIndex::new(store.clone());
        let archive = DocumentIndex::with_key(store, "ARCHIVED_PDFS");

        main.append(scan_1()).expect("append");
        assert!(archive.list().expect("list").is_empty());
        assert_eq!(archive.key(), "ARCHIVED_PDFS");
    }
}
