// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Blobs: opaque, named byte payloads attached to a manifest version, out
//! of band from the columnar data path.

use bytes::Bytes;
use tracing::instrument;
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_format::{paths, BlobEntry};

use crate::space::Space;

/// Write `content` under a fresh name-addressed file and record it on a
/// new manifest version. Fails `BlobAlreadyExists` if `replace` is false
/// and `name` is already recorded; a `replace=true` call is the only way
/// to overwrite an existing entry, and it still produces a new version
/// rather than mutating the old one.
#[instrument(skip(space, content))]
pub async fn write_blob(space: &Space, content: &[u8], name: &str, replace: bool) -> Result<()> {
    let manifest = space.current_manifest().await;
    if !replace && manifest.has_blob(name) {
        return Err(Error::blob_already_exists(name, snafu::location!()));
    }

    let path = paths::new_blob_file_path();
    let full_path = space.store().join(&path);
    space
        .store()
        .put_bytes(&full_path, Bytes::copy_from_slice(content))
        .await?;

    let written = space.store().size(&full_path).await?;
    if written != content.len() {
        return Err(Error::short_write(content.len(), written, snafu::location!()));
    }

    let entry = BlobEntry {
        name: name.to_string(),
        size: content.len() as i64,
        file_path: path,
    };

    space
        .publish(move |current, version| {
            let mut next = current.clone();
            next.version = version;
            next.blobs.retain(|b| b.name != entry.name);
            next.blobs.push(entry.clone());
            next
        })
        .await?;

    Ok(())
}

/// Read the full content of the blob named `name`.
pub async fn read_blob(space: &Space, name: &str) -> Result<Bytes> {
    let manifest = space.current_manifest().await;
    let entry = manifest
        .blobs
        .iter()
        .find(|b| b.name == name)
        .ok_or_else(|| Error::blob_not_found(name, snafu::location!()))?;
    let path = space.store().join(&entry.file_path);
    space.store().get_bytes(&path).await
}

/// The declared size, in bytes, of the blob named `name`.
pub async fn blob_size(space: &Space, name: &str) -> Result<i64> {
    let manifest = space.current_manifest().await;
    manifest
        .blobs
        .iter()
        .find(|b| b.name == name)
        .map(|b| b.size)
        .ok_or_else(|| Error::blob_not_found(name, snafu::location!()))
}
