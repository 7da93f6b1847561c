// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! The Space: a directory-rooted columnar dataset. Opens/creates itself
//! against a manifest store, and serializes every publish (write, delete,
//! blob write) through a single exclusive write lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::instrument;
use vspace_core::Result;
use vspace_format::manifest_store::{self, OpenVersion};
use vspace_format::{Manifest, SchemaView};
use vspace_io::VspaceStore;

use crate::options::SpaceOpenOptions;

/// A Space is cheaply `Clone`: every clone shares the same manifest
/// pointer and write lock, so a publish made through one clone is visible
/// to every other. Readers snapshot [`Self::current_manifest`] and
/// operate on that immutable value without further synchronization;
/// writers serialize through [`Self::publish`].
#[derive(Clone)]
pub struct Space {
    pub(crate) store: VspaceStore,
    manifest: Arc<RwLock<Arc<Manifest>>>,
    write_lock: Arc<Mutex<()>>,
    next_version: Arc<AtomicU64>,
}

impl Space {
    /// Open a Space at `options.uri`. Creates an empty version-0 manifest
    /// if none exists yet (requires `options.create`); otherwise resolves
    /// to the pinned or newest version per the selection policy in
    /// `vspace_format::manifest_store`.
    #[instrument(skip(options), fields(uri = %options.uri))]
    pub async fn open(options: SpaceOpenOptions) -> Result<Self> {
        let store = VspaceStore::open(&options.uri)?;
        let schema_for_create = options
            .create
            .map(|c| SchemaView::derive(c.schema, c.roles))
            .transpose()?;
        let open_version = match options.version {
            Some(v) => OpenVersion::Pinned(v),
            None => OpenVersion::Newest,
        };
        let manifest = manifest_store::select(&store, open_version, schema_for_create).await?;
        let next_version = manifest.version + 1;
        tracing::debug!(version = manifest.version, next_version, "space opened");
        Ok(Self {
            store,
            manifest: Arc::new(RwLock::new(Arc::new(manifest))),
            write_lock: Arc::new(Mutex::new(())),
            next_version: Arc::new(AtomicU64::new(next_version)),
        })
    }

    /// Snapshot the manifest current at the moment of the call. Holding
    /// onto the returned `Arc` keeps it alive past any subsequent publish;
    /// a reader built from this snapshot never observes later writes.
    pub async fn current_manifest(&self) -> Arc<Manifest> {
        self.manifest.read().await.clone()
    }

    pub fn store(&self) -> &VspaceStore {
        &self.store
    }

    /// Run the clone -> mutate -> persist -> swap -> advance protocol
    /// under the Space's exclusive write lock.
    ///
    /// `mutate` receives the manifest current at lock-acquisition time and
    /// the version this publish must land at (`next_version` as of the
    /// call); it returns the manifest to persist. The in-memory pointer is
    /// swapped, and `next_version` only advances, after persistence
    /// succeeds -- a failure here leaves both unchanged, exactly as
    /// required for partial-write recovery.
    pub(crate) async fn publish<F>(&self, mutate: F) -> Result<Arc<Manifest>>
    where
        F: FnOnce(&Manifest, u64) -> Manifest,
    {
        let _guard = self.write_lock.lock().await;
        let current = self.manifest.read().await.clone();
        let version = self.next_version.load(Ordering::SeqCst);

        let next = mutate(&current, version);
        manifest_store::save(&self.store, &next).await?;

        let next = Arc::new(next);
        *self.manifest.write().await = next.clone();
        self.next_version.store(version + 1, Ordering::SeqCst);
        tracing::debug!(version, "published new manifest");
        Ok(next)
    }
}
