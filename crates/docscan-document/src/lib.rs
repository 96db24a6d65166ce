// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document — turning captured page images into stored documents.
//
// Provides scan-to-PDF conversion (one image per page) and content-hash file
// naming for the PDFs and page images written to the documents directory.

pub mod naming;
pub mod pdf;

pub use naming::{content_file_name, hash_bytes};
pub use pdf::writer::PdfWriter;
