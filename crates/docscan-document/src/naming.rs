// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed file names for saved scans.

use sha2::{Digest, Sha256};

/// Hex digits of the digest kept in file names.
const NAME_HASH_LEN: usize = 16;

/// SHA-256 of `data` as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// File name for `data` with the given extension, e.g. `page-3f2a…9c.jpg`.
///
/// The name depends only on the bytes, so saving the same page image twice
/// reuses one file. Generated PDFs differ from run to run and always get a
/// fresh name.
pub fn content_file_name(prefix: &str, data: &[u8], extension: &str) -> String {
    let digest = hash_bytes(data);
    let extension = extension.trim_start_matches('.');
    format!("{prefix}-{}.{extension}", &digest[..NAME_HASH_LEN])
}
