// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for scan-to-PDF conversion and content hashing.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use docscan_document::{PdfWriter, content_file_name};

/// A 600x800 grey page with a darker block where text would be, as PNG.
fn synthetic_page() -> Vec<u8> {
    let (width, height) = (600u32, 800u32);
    let mut img = GrayImage::from_pixel(width, height, Luma([235u8]));
    for y in 100..300 {
        for x in 80..520 {
            img.put_pixel(x, y, Luma([40u8]));
        }
    }
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    buf
}

fn bench_scan_to_pdf(c: &mut Criterion) {
    let pages = vec![synthetic_page(); 3];
    let writer = PdfWriter::a4();

    c.bench_function("create_from_images (3 pages, 600x800)", |b| {
        b.iter(|| black_box(writer.create_from_images(black_box(&pages)).expect("pdf")));
    });
}

fn bench_content_name(c: &mut Criterion) {
    let page = synthetic_page();
    c.bench_function("content_file_name (600x800 png)", |b| {
        b.iter(|| black_box(content_file_name("scan", black_box(&page), "pdf")));
    });
}

criterion_group!(benches, bench_scan_to_pdf, bench_content_name);
criterion_main!(benches);
