// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Deterministic directory and filename derivation for a Space.
//!
//! Every function here is pure: given a Space root, it derives a relative
//! path string. The caller (`vspace_io::VspaceStore::join`) is responsible
//! for joining it onto the actual root. Data filenames carry no semantic
//! meaning beyond uniqueness -- fragment membership is authoritative from
//! the manifest, and nothing in this crate parses a data filename to
//! recover state.

use uuid::Uuid;

pub const MANIFEST_DIR: &str = "manifest";
pub const SCALAR_DIR: &str = "scalar";
pub const VECTOR_DIR: &str = "vector";
pub const DELETE_DIR: &str = "delete";
pub const BLOB_DIR: &str = "blob";

pub const MANIFEST_EXT: &str = "mf";
pub const MANIFEST_TMP_SUFFIX: &str = ".mf.tmp";
pub const DATA_EXT: &str = "parquet";

/// Sentinel returned by [`parse_version_from_file_name`] for names that do
/// not match the committed manifest naming pattern.
pub const UNPARSEABLE_VERSION: i64 = -1;

pub fn manifest_path(version: u64) -> String {
    format!("{MANIFEST_DIR}/{version}.{MANIFEST_EXT}")
}

pub fn manifest_tmp_path(version: u64) -> String {
    format!("{MANIFEST_DIR}/{version}{MANIFEST_TMP_SUFFIX}")
}

/// A fresh, collision-resistant data filename: 128 bits of entropy
/// (a v4 UUID, hex-encoded) suffixed with the codec extension.
fn new_file_stem() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn new_scalar_file_path() -> String {
    format!("{SCALAR_DIR}/{}.{DATA_EXT}", new_file_stem())
}

pub fn new_vector_file_path() -> String {
    format!("{VECTOR_DIR}/{}.{DATA_EXT}", new_file_stem())
}

pub fn new_delete_file_path() -> String {
    format!("{DELETE_DIR}/{}.{DATA_EXT}", new_file_stem())
}

pub fn new_blob_file_path() -> String {
    format!("{BLOB_DIR}/{}", new_file_stem())
}

/// Parse the version embedded in a committed manifest filename
/// (`<version>.mf`), or [`UNPARSEABLE_VERSION`] if `name` does not match
/// that pattern -- including in-flight `.mf.tmp` files, which must be
/// ignored by manifest enumeration.
pub fn parse_version_from_file_name(name: &str) -> i64 {
    match name.strip_suffix(&format!(".{MANIFEST_EXT}")) {
        Some(stem) => stem.parse::<i64>().unwrap_or(UNPARSEABLE_VERSION),
        None => UNPARSEABLE_VERSION,
    }
}
