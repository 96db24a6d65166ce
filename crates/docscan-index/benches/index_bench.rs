// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the document index. Every operation decodes the
// whole collection, so these track how a large library scales.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use docscan_core::DocumentRecord;
use docscan_index::{DocumentIndex, MemoryStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build an index holding `count` records, every tenth carrying OCR text.
fn seeded_index(count: usize) -> DocumentIndex {
    let index = DocumentIndex::new(Arc::new(MemoryStore::new()));
    for n in 0..count {
        let mut record = DocumentRecord::new(format!("Scan_{n}"), format!("/docs/{n}.pdf"))
            .with_image_path(format!("/docs/{n}.jpg"));
        if n % 10 == 0 {
            record = record.with_ocr_text("Lorem ipsum dolor sit amet ".repeat(40));
        }
        index.append(record).expect("seed append");
    }
    index
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Case-insensitive search over 1,000 records.
fn bench_find_by_name(c: &mut Criterion) {
    let index = seeded_index(1_000);

    c.bench_function("find_by_name_contains (1000 records)", |b| {
        b.iter(|| {
            let hits = index
                .find_by_name_contains(black_box("scan_99"))
                .expect("search");
            black_box(hits);
        });
    });
}

/// Full read-modify-write cycle over 1,000 records.
fn bench_rename(c: &mut Criterion) {
    let index = seeded_index(1_000);

    c.bench_function("rename (1000 records)", |b| {
        b.iter(|| {
            let renamed = index
                .rename(black_box("/docs/500.pdf"), black_box("Renamed"))
                .expect("rename");
            black_box(renamed);
        });
    });
}

criterion_group!(benches, bench_find_by_name, bench_rename);
criterion_main!(benches);
