// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! The delete set: an in-memory mapping from primary key to the versions
//! at which that key was tombstoned, built on demand from every delete
//! fragment of a manifest snapshot.
//!
//! The primary key is a closed sum over the supported physical types
//! (`Int64`, `Utf8`), dispatched once at construction on the delete
//! schema's primary column data type -- not re-dispatched per row.

use std::collections::HashMap;

use arrow_array::{Array, ArrayRef, Int64Array, StringArray};
use arrow_schema::DataType;
use futures::TryStreamExt;
use tracing::instrument;
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_format::Manifest;
use vspace_io::VspaceStore;

/// The primary key's native type, as carried by the delete set. Extend
/// with a new variant (and a matching arm in [`primary_keys_from_array`])
/// to support another primary-key physical type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimaryKey {
    Int64(i64),
    Utf8(String),
}

/// The in-memory index built from all delete fragments of one manifest
/// snapshot: primary key -> the ordered list of versions at which it was
/// marked deleted (empty when the schema has no version column).
#[derive(Debug, Default)]
pub struct DeleteSet {
    deleted: HashMap<PrimaryKey, Vec<i64>>,
}

impl DeleteSet {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }

    /// Stream every delete file referenced by `manifest` through the
    /// two-column visitor (key column, optional version column) and fold
    /// the result into one map.
    #[instrument(skip(store, manifest), fields(version = manifest.version))]
    pub async fn build(store: &VspaceStore, manifest: &Manifest) -> Result<Self> {
        let mut deleted: HashMap<PrimaryKey, Vec<i64>> = HashMap::new();
        let has_version = manifest.schema.has_version_column();

        for fragment in &manifest.delete_fragments {
            for file in &fragment.files {
                let path = store.join(file);
                let builder = store.parquet_reader_builder(&path).await?;
                let mut batches = builder.build()?;
                while let Some(batch) = batches.try_next().await? {
                    let keys = primary_keys_from_array(batch.column(0))?;
                    let versions = if has_version {
                        Some(cast_to_i64(batch.column(1))?)
                    } else {
                        None
                    };
                    for (i, key) in keys.into_iter().enumerate() {
                        let entry = deleted.entry(key).or_default();
                        if let Some(versions) = &versions {
                            if versions.is_valid(i) {
                                entry.push(versions.value(i));
                            }
                        }
                    }
                }
            }
        }

        Ok(Self { deleted })
    }

    /// The apply-on-read rule: a live row with primary key `key` and
    /// version column value `live_version` is visible iff `key` is not in
    /// the delete set, or the maximum recorded delete-version for `key` is
    /// strictly less than `live_version`. When the schema has no version
    /// column, `live_version` is `None` and any presence of `key` in the
    /// delete set suppresses the row.
    pub fn is_visible(&self, key: &PrimaryKey, live_version: Option<i64>) -> bool {
        match self.deleted.get(key) {
            None => true,
            Some(versions) => match live_version {
                Some(v) => match versions.iter().copied().max() {
                    Some(max_deleted) => max_deleted < v,
                    None => true,
                },
                None => false,
            },
        }
    }
}

/// Dispatch on `array`'s data type and extract one [`PrimaryKey`] per row
/// (nulls are skipped, matching the invariant that the primary column is
/// never null).
pub fn primary_keys_from_array(array: &ArrayRef) -> Result<Vec<PrimaryKey>> {
    match array.data_type() {
        DataType::Int64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .expect("data type checked above");
            Ok((0..arr.len())
                .filter(|&i| arr.is_valid(i))
                .map(|i| PrimaryKey::Int64(arr.value(i)))
                .collect())
        }
        DataType::Utf8 => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("data type checked above");
            Ok((0..arr.len())
                .filter(|&i| arr.is_valid(i))
                .map(|i| PrimaryKey::Utf8(arr.value(i).to_string()))
                .collect())
        }
        other => Err(Error::schema_invalid(
            format!("unsupported primary key physical type for the delete set: {other:?}"),
            snafu::location!(),
        )),
    }
}

fn cast_to_i64(array: &ArrayRef) -> Result<Int64Array> {
    let casted = arrow_cast::cast(array, &DataType::Int64)?;
    Ok(Int64Array::from(casted.to_data()))
}
