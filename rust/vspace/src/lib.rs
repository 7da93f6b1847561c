// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! vspace: a columnar table store for datasets that pair scalar fields
//! with one high-dimensional vector field.
//!
//! A [`Space`] lives under a single directory. Writers append record
//! batches through [`writer::write`]; tombstone deletions go through
//! [`delete::delete`]; readers materialize a point-in-time view through
//! [`read::read`]; out-of-band byte payloads go through [`blob`]. Readers
//! and writers reconcile through a versioned, atomically-published
//! manifest -- see [`vspace_format`] for the Manifest/Fragment/Schema
//! layer this crate builds on, and [`vspace_io`] for the storage
//! abstraction underneath that.

pub mod blob;
pub mod delete;
pub mod delete_set;
pub mod options;
pub mod read;
pub mod space;
pub mod writer;

#[cfg(test)]
mod test_util;

pub use blob::{blob_size, read_blob, write_blob};
pub use delete::delete;
pub use delete_set::{DeleteSet, PrimaryKey};
pub use options::{CreateSchema, Filter, FilterValue, ReadOptions, SpaceOpenOptions, WriteOptions};
pub use read::read;
pub use space::Space;
pub use writer::write;

use arrow_array::RecordBatch;
use futures::stream::BoxStream;
use vspace_core::Result;

/// A finite, lazy sequence of record batches: the input to
/// [`writer::write`] and [`delete::delete`], and the output of
/// [`read::read`].
pub type RecordBatchStream = BoxStream<'static, Result<RecordBatch>>;
