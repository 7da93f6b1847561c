// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! A Fragment groups the files produced by a single write (or delete),
//! tagged with the manifest version that introduced it. Fragments are
//! created once and never mutated afterward.

/// `id` equals the manifest version that introduced the fragment. Within
/// one write, the scalar and vector fragments share an id; a delete
/// fragment stands alone. A fragment's kind (scalar, vector, or delete)
/// is implicit in which list it lives in on
/// [`crate::manifest::Manifest`] -- there is no separate kind tag on the
/// value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub id: i64,
    pub files: Vec<String>,
}

impl Fragment {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            files: Vec::new(),
        }
    }

    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id,
            files: self.files.clone(),
        }
    }

    pub(crate) fn to_pb(&self) -> crate::pb::Fragment {
        crate::pb::Fragment {
            id: self.id,
            files: self.files.clone(),
        }
    }

    pub(crate) fn from_pb(pb: crate::pb::Fragment) -> Self {
        Self {
            id: pb.id,
            files: pb.files,
        }
    }
}
