// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! The Space/Manifest/Fragment format layer: derives the scalar, vector,
//! and delete schemas from a user schema, names every file a Space can
//! hold, and owns the Manifest value type plus its atomic persist/load.
//!
//! Everything in this crate is a pure value or a thin wrapper over
//! [`vspace_io::VspaceStore`]; the write/delete/read/blob pipelines that
//! mutate a Space live one layer up, in `vspace`.

pub mod fragment;
pub mod manifest;
pub mod manifest_store;
pub mod paths;
pub mod pb;
pub mod schema;

pub use fragment::Fragment;
pub use manifest::{BlobEntry, Manifest};
pub use manifest_store::OpenVersion;
pub use schema::{Roles, SchemaView};
