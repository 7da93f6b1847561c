// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

use std::sync::Arc;

use arrow_schema::SchemaRef;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use parquet::arrow::arrow_writer::ArrowWriterOptions;
use parquet::arrow::async_reader::{ParquetObjectReader, ParquetRecordBatchStreamBuilder};
use parquet::arrow::async_writer::{AsyncArrowWriter, ParquetObjectWriter};
use tracing::debug;
use url::Url;
use vspace_core::error::Error;
use vspace_core::Result;

/// A Space's storage backend: an [`ObjectStore`] plus the root [`Path`] its
/// data lives under.
///
/// This is the core's only window onto the filesystem. It never downcasts
/// the trait object, so any `ObjectStore` implementation (local disk, an
/// object store) works identically; the test suite exercises
/// [`LocalFileSystem`].
#[derive(Clone)]
pub struct VspaceStore {
    store: Arc<dyn ObjectStore>,
    root: Path,
}

impl VspaceStore {
    /// Resolve a Space root URI to a concrete store.
    ///
    /// `file://` URIs are backed by [`LocalFileSystem`]; any other scheme is
    /// handed to `object_store::parse_url`, which resolves it to whichever
    /// backend understands that scheme.
    pub fn open(uri: &str) -> Result<Self> {
        let url = Url::parse(uri)
            .map_err(|e| Error::io(format!("invalid space uri '{uri}': {e}"), snafu::location!()))?;

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| Error::io(format!("invalid file uri '{uri}'"), snafu::location!()))?;
            std::fs::create_dir_all(&path)?;
            let store = LocalFileSystem::new_with_prefix(&path)
                .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
            return Ok(Self {
                store: Arc::new(store),
                root: Path::from(""),
            });
        }

        let (store, root) = object_store::parse_url(&url)
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        Ok(Self {
            store: Arc::from(store),
            root,
        })
    }

    /// Join a `/`-delimited relative path onto the Space root.
    pub fn join(&self, rel: &str) -> Path {
        let rel_path = Path::from(rel);
        Path::from_iter(self.root.parts().chain(rel_path.parts()))
    }

    /// Idempotent directory creation. Object stores have no real directory
    /// concept; creating one is therefore a no-op once the root itself
    /// exists (handled in [`Self::open`]). The method exists so call sites
    /// read the same way they would against a real filesystem.
    pub fn create_dir(&self, _rel: &str) -> Result<()> {
        Ok(())
    }

    /// List every object directly under `dir` (non-recursive), sorted by
    /// path.
    pub async fn list(&self, dir: &Path) -> Result<Vec<Path>> {
        let mut entries: Vec<Path> = self
            .store
            .list(Some(dir))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        entries.sort();
        Ok(entries)
    }

    pub async fn get_bytes(&self, path: &Path) -> Result<Bytes> {
        let result = self
            .store
            .get(path)
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        result
            .bytes()
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))
    }

    pub async fn put_bytes(&self, path: &Path, bytes: Bytes) -> Result<()> {
        self.store
            .put(path, PutPayload::from(bytes))
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        Ok(())
    }

    /// The size in bytes of the object at `path`, as reported by the
    /// store's own metadata -- used to verify a blob write landed in full
    /// without re-reading the payload back.
    pub async fn size(&self, path: &Path) -> Result<usize> {
        let meta = self
            .store
            .head(path)
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        Ok(meta.size as usize)
    }

    /// Atomically rename `from` to `to`. This is the publication primitive
    /// manifest persistence relies on: the underlying store must guarantee
    /// the rename either fully succeeds or leaves `from` untouched.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        debug!(from = %from, to = %to, "renaming manifest file");
        self.store
            .rename(from, to)
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))
    }

    /// Open a Parquet writer over a fresh file at `path` for `schema`.
    pub fn parquet_writer(
        &self,
        path: &Path,
        schema: SchemaRef,
    ) -> Result<AsyncArrowWriter<ParquetObjectWriter>> {
        let sink = ParquetObjectWriter::new(self.store.clone(), path.clone());
        AsyncArrowWriter::try_new_with_options(sink, schema, ArrowWriterOptions::new())
            .map_err(Error::from)
    }

    /// Build a batch-stream reader over the Parquet file at `path`.
    pub async fn parquet_reader_builder(
        &self,
        path: &Path,
    ) -> Result<ParquetRecordBatchStreamBuilder<ParquetObjectReader>> {
        let meta = self
            .store
            .head(path)
            .await
            .map_err(|e| Error::io(e.to_string(), snafu::location!()))?;
        let reader = ParquetObjectReader::new(self.store.clone(), meta);
        ParquetRecordBatchStreamBuilder::new(reader)
            .await
            .map_err(Error::from)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
