// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Atomic persist/load of manifests, and the open-time selection policy
//! (newest-wins or a pinned version) described in spec section 4.3.

use object_store::path::Path;
use tracing::{debug, warn};
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_io::VspaceStore;

use crate::manifest::Manifest;
use crate::paths;
use crate::schema::SchemaView;

/// Which version a Space open call should resolve to.
#[derive(Debug, Clone, Copy)]
pub enum OpenVersion {
    Newest,
    Pinned(u64),
}

/// Enumerate the manifest directory, discard names with no parseable
/// version (including in-flight `.mf.tmp` files), and sort ascending by
/// version.
pub async fn list_manifests(store: &VspaceStore) -> Result<Vec<(i64, Path)>> {
    let dir = store.join(paths::MANIFEST_DIR);
    let mut entries: Vec<(i64, Path)> = store
        .list(&dir)
        .await?
        .into_iter()
        .filter_map(|path| {
            let name = path.filename()?.to_string();
            let version = paths::parse_version_from_file_name(&name);
            if version == paths::UNPARSEABLE_VERSION {
                warn!(path = %path, "skipping unparseable manifest file name");
                None
            } else {
                Some((version, path))
            }
        })
        .collect();
    entries.sort_by_key(|(version, _)| *version);
    Ok(entries)
}

/// Read and decode the manifest at `path`, verifying that the version it
/// declares internally matches the version encoded in its filename.
pub async fn load(store: &VspaceStore, path: &Path, filename_version: i64) -> Result<Manifest> {
    let bytes = store.get_bytes(path).await?;
    let manifest = Manifest::decode(&bytes)?;
    if manifest.version as i64 != filename_version {
        return Err(Error::manifest_corrupt(
            format!(
                "manifest at '{path}' declares version {} but its filename encodes {filename_version}",
                manifest.version
            ),
            snafu::location!(),
        ));
    }
    Ok(manifest)
}

/// Write `manifest` to its `.tmp` path, then atomically rename it to the
/// final `<version>.mf` path. If the rename fails, the temp file is left
/// behind for external cleanup and this call fails -- the core never
/// retries or cleans up orphaned `.tmp` files itself.
pub async fn save(store: &VspaceStore, manifest: &Manifest) -> Result<()> {
    let tmp_path = store.join(&paths::manifest_tmp_path(manifest.version));
    let final_path = store.join(&paths::manifest_path(manifest.version));
    let bytes = manifest.encode()?;
    debug!(version = manifest.version, path = %final_path, "persisting manifest");
    store.put_bytes(&tmp_path, bytes.into()).await?;
    store.rename(&tmp_path, &final_path).await
}

/// The open-time selection policy of spec section 4.3: create an empty
/// version-0 manifest if none exists (requires `schema_for_create`), pick
/// a pinned version if requested, or otherwise pick the newest.
pub async fn select(
    store: &VspaceStore,
    open_version: OpenVersion,
    schema_for_create: Option<SchemaView>,
) -> Result<Manifest> {
    let entries = list_manifests(store).await?;
    if entries.is_empty() {
        let schema = schema_for_create.ok_or_else(|| {
            Error::schema_missing(
                "no manifest exists in this space and no schema was supplied to create one",
                snafu::location!(),
            )
        })?;
        return Ok(Manifest::empty(schema));
    }

    match open_version {
        OpenVersion::Pinned(v) => {
            let (version, path) = entries
                .iter()
                .find(|(ver, _)| *ver == v as i64)
                .ok_or_else(|| {
                    Error::manifest_not_found(
                        format!("no manifest exists at version {v}"),
                        snafu::location!(),
                    )
                })?;
            load(store, path, *version).await
        }
        OpenVersion::Newest => {
            let (version, path) = entries.last().expect("checked non-empty above");
            load(store, path, *version).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_schema::{DataType, Field, Schema};

    use super::*;
    use crate::schema::Roles;

    fn schema_view() -> SchemaView {
        let user_schema = Arc::new(Schema::new(vec![
            Field::new("pk", DataType::Int64, false),
            Field::new(
                "vec",
                DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), 4),
                false,
            ),
        ]));
        SchemaView::derive(
            user_schema,
            Roles {
                primary_column: "pk".to_string(),
                version_column: None,
                vector_column: "vec".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_fails_without_schema_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = VspaceStore::open(&format!("file://{}", dir.path().display())).unwrap();
        let err = select(&store, OpenVersion::Newest, None).await.unwrap_err();
        assert!(matches!(err, Error::SchemaMissing { .. }));
    }

    #[tokio::test]
    async fn creates_empty_version_zero_with_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = VspaceStore::open(&format!("file://{}", dir.path().display())).unwrap();
        let manifest = select(&store, OpenVersion::Newest, Some(schema_view()))
            .await
            .unwrap();
        assert_eq!(manifest.version, 0);
        assert!(manifest.scalar_fragments.is_empty());
    }

    #[tokio::test]
    async fn save_then_newest_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = VspaceStore::open(&format!("file://{}", dir.path().display())).unwrap();
        let mut m = Manifest::empty(schema_view());
        m.version = 1;
        save(&store, &m).await.unwrap();

        let loaded = select(&store, OpenVersion::Newest, None).await.unwrap();
        assert_eq!(loaded, m);
    }

    #[tokio::test]
    async fn pinned_version_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = VspaceStore::open(&format!("file://{}", dir.path().display())).unwrap();
        let mut m = Manifest::empty(schema_view());
        m.version = 1;
        save(&store, &m).await.unwrap();

        let err = select(&store, OpenVersion::Pinned(7), None).await.unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound { .. }));
    }
}
