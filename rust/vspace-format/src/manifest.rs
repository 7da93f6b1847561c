// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Manifest: the immutable, versioned catalog of a Space's schema,
//! fragments, and blobs.

use std::sync::Arc;

use arrow_ipc::convert::try_schema_from_ipc_buffer;
use arrow_ipc::writer::{schema_to_bytes, IpcWriteOptions};
use prost::Message;
use vspace_core::error::Error;
use vspace_core::Result;

use crate::fragment::Fragment;
use crate::pb;
use crate::schema::{Roles, SchemaView};

/// One named blob entry recorded on a manifest. Blobs are immutable once
/// written; a `replace=true` call produces a new entry with the same name
/// under a new manifest version, it never mutates this value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub name: String,
    pub size: i64,
    pub file_path: String,
}

/// Immutable snapshot of a Space at a given version: the derived schema
/// view, the three ordered fragment lists, and the blob entries. Identity
/// is by `version`; values compare structurally.
///
/// `version`'s own type is `u64` here to match the wire format, though the
/// spec's fragment ids and filename parsing use `i64` with `-1` as an
/// unparseable sentinel -- the two only ever meet at non-negative values.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub schema: SchemaView,
    pub scalar_fragments: Vec<Fragment>,
    pub vector_fragments: Vec<Fragment>,
    pub delete_fragments: Vec<Fragment>,
    pub blobs: Vec<BlobEntry>,
    pub version: u64,
}

impl Manifest {
    /// The initial, empty manifest created at version 0 when a Space is
    /// opened with no existing manifest on disk.
    pub fn empty(schema: SchemaView) -> Self {
        Self {
            schema,
            scalar_fragments: Vec::new(),
            vector_fragments: Vec::new(),
            delete_fragments: Vec::new(),
            blobs: Vec::new(),
            version: 0,
        }
    }

    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.iter().any(|b| b.name == name)
    }

    /// A clone of this manifest with every scalar/vector/delete fragment
    /// carrying `id = version`, the new fragment lists appended, and
    /// `version` set. This is the mutation step of the clone-mutate-persist
    /// protocol every write/delete/blob call follows under the Space write
    /// lock.
    pub fn with_new_version(
        &self,
        version: u64,
        new_scalar: Option<Fragment>,
        new_vector: Option<Fragment>,
        new_delete: Option<Fragment>,
    ) -> Self {
        let mut next = self.clone();
        next.version = version;
        if let Some(f) = new_scalar {
            next.scalar_fragments.push(f.with_id(version as i64));
        }
        if let Some(f) = new_vector {
            next.vector_fragments.push(f.with_id(version as i64));
        }
        if let Some(f) = new_delete {
            next.delete_fragments.push(f.with_id(version as i64));
        }
        next
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let pb = self.to_pb()?;
        let mut buf = Vec::with_capacity(pb.encoded_len());
        pb.encode(&mut buf)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let pb = pb::Manifest::decode(bytes)?;
        Self::from_pb(pb)
    }

    fn to_pb(&self) -> Result<pb::Manifest> {
        let user_schema_ipc =
            schema_to_bytes(&self.schema.user_schema, &IpcWriteOptions::default());
        Ok(pb::Manifest {
            version: self.version,
            user_schema_ipc,
            primary_column: self.schema.roles.primary_column.clone(),
            version_column: self.schema.roles.version_column.clone().unwrap_or_default(),
            vector_column: self.schema.roles.vector_column.clone(),
            scalar_fragments: self.scalar_fragments.iter().map(Fragment::to_pb).collect(),
            vector_fragments: self.vector_fragments.iter().map(Fragment::to_pb).collect(),
            delete_fragments: self.delete_fragments.iter().map(Fragment::to_pb).collect(),
            blobs: self
                .blobs
                .iter()
                .map(|b| pb::BlobEntry {
                    name: b.name.clone(),
                    size: b.size,
                    file_path: b.file_path.clone(),
                })
                .collect(),
        })
    }

    fn from_pb(msg: pb::Manifest) -> Result<Self> {
        let user_schema = try_schema_from_ipc_buffer(&msg.user_schema_ipc)
            .map_err(|e| Error::manifest_corrupt(e.to_string(), snafu::location!()))?;
        let roles = Roles {
            primary_column: msg.primary_column,
            version_column: if msg.version_column.is_empty() {
                None
            } else {
                Some(msg.version_column)
            },
            vector_column: msg.vector_column,
        };
        let schema = SchemaView::derive(Arc::new(user_schema), roles)?;
        Ok(Self {
            schema,
            scalar_fragments: msg.scalar_fragments.into_iter().map(Fragment::from_pb).collect(),
            vector_fragments: msg.vector_fragments.into_iter().map(Fragment::from_pb).collect(),
            delete_fragments: msg.delete_fragments.into_iter().map(Fragment::from_pb).collect(),
            blobs: msg
                .blobs
                .into_iter()
                .map(|b| BlobEntry {
                    name: b.name,
                    size: b.size,
                    file_path: b.file_path,
                })
                .collect(),
            version: msg.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_schema::{DataType, Field, Schema};

    fn schema_view() -> SchemaView {
        let user_schema = Arc::new(Schema::new(vec![
            Field::new("pk", DataType::Int64, false),
            Field::new("ver", DataType::Int64, false),
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
                version_column: Some("ver".to_string()),
                vector_column: "vec".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn with_new_version_stamps_fragment_ids() {
        let m = Manifest::empty(schema_view());
        let next = m.with_new_version(
            1,
            Some(Fragment::new(0)),
            Some(Fragment::new(0)),
            None,
        );
        assert_eq!(next.version, 1);
        assert_eq!(next.scalar_fragments.len(), 1);
        assert_eq!(next.scalar_fragments[0].id, 1);
        assert_eq!(next.vector_fragments[0].id, 1);
        assert!(next.delete_fragments.is_empty());
    }

    #[test]
    fn encode_decode_round_trips() {
        let mut m = Manifest::empty(schema_view());
        let mut scalar = Fragment::new(1);
        scalar.files.push("scalar/a.parquet".to_string());
        let mut vector = Fragment::new(1);
        vector.files.push("vector/a.parquet".to_string());
        m = m.with_new_version(1, Some(scalar), Some(vector), None);
        m.blobs.push(BlobEntry {
            name: "greet".to_string(),
            size: 5,
            file_path: "blob/xyz".to_string(),
        });

        let bytes = m.encode().unwrap();
        let back = Manifest::decode(&bytes).unwrap();
        assert_eq!(back, m);
    }
}
