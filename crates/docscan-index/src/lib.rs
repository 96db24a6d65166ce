// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-index — the document library's only structured data store.
//
// The whole collection lives as one JSON array under a single key of a
// key-value store. `DocumentIndex` provides append, list, search, rename, and
// remove over it; `MemoryStore` and `SqliteStore` provide the storage.

pub mod index;
pub mod schema;
pub mod sqlite;
pub mod store;

pub use index::{DocumentIndex, NormalizeReport};
pub use sqlite::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};
