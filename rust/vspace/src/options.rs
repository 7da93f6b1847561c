// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! The tunables every public entry point accepts: `WriteOptions` for
//! `write`, `ReadOptions` for `read`, and `SpaceOpenOptions` for `open`.

use arrow_schema::SchemaRef;
use vspace_format::Roles;

/// A sane default row threshold for `WriteOptions::max_record_per_file`.
/// Callers writing large batches should pick a value matched to their row
/// size; this only keeps `WriteOptions::default()` from being an
/// unbounded single file.
pub const DEFAULT_MAX_RECORD_PER_FILE: u64 = 1_048_576;

/// Options for [`crate::writer::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Row count threshold at which the current scalar/vector file pair is
    /// closed and a new one opened.
    pub max_record_per_file: u64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            max_record_per_file: DEFAULT_MAX_RECORD_PER_FILE,
        }
    }
}

/// A constant value a [`Filter`] compares a column against.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Bool(bool),
}

/// A constant predicate `column OP literal` recognized by [`crate::read`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, FilterValue),
    Ne(String, FilterValue),
    Lt(String, FilterValue),
    Le(String, FilterValue),
    Gt(String, FilterValue),
    Ge(String, FilterValue),
    In(String, Vec<FilterValue>),
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _)
            | Self::Ne(c, _)
            | Self::Lt(c, _)
            | Self::Le(c, _)
            | Self::Gt(c, _)
            | Self::Ge(c, _)
            | Self::In(c, _) => c,
        }
    }
}

/// Options for [`crate::read::read`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Subset of the user schema's fields to project. Must be a subset of
    /// the user schema; `None` means every field.
    pub columns: Option<Vec<String>>,
    /// Constant predicates applied after the delete set.
    pub filters: Vec<Filter>,
    /// When set, rows are filtered to `version_column <= version`. Ignored
    /// (has no effect) when the schema has no version column.
    pub version: Option<i64>,
}

/// The schema-plus-roles payload required only when [`SpaceOpenOptions`]
/// is opening a Space for the first time (no manifest exists yet).
#[derive(Debug, Clone)]
pub struct CreateSchema {
    pub schema: SchemaRef,
    pub roles: Roles,
}

/// Arguments to [`crate::space::Space::open`].
#[derive(Debug, Clone)]
pub struct SpaceOpenOptions {
    /// The Space root, e.g. `file:///data/my_space`.
    pub uri: String,
    /// Pin the open to a specific manifest version. `None` opens the
    /// newest manifest.
    pub version: Option<u64>,
    /// Supplied only when creating a brand-new Space; required if no
    /// manifest exists yet, ignored otherwise.
    pub create: Option<CreateSchema>,
}

impl SpaceOpenOptions {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            version: None,
            create: None,
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_create(mut self, schema: SchemaRef, roles: Roles) -> Self {
        self.create = Some(CreateSchema { schema, roles });
        self
    }
}
