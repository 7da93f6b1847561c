// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! The filesystem/object-store abstraction a [`Space`](vspace-level
//! consumer) is built on.
//!
//! This crate is a thin wrapper over the `object_store` crate: it resolves a
//! Space's root URI to a concrete [`ObjectStore`] plus a root [`Path`], and
//! exposes the small surface the core actually needs (create/list/rename,
//! plus Parquet-aware reader/writer construction). `object_store`'s own
//! `LocalFileSystem` backend is what we exercise in tests; any other backend
//! reachable through the `ObjectStore` trait works the same way, since the
//! core never downcasts.

pub mod store;

pub use store::VspaceStore;
