// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Derives the scalar, vector, and delete schemas from a user schema plus
//! column-role assignments, and freezes them for the Space's lifetime.

use std::sync::Arc;

use arrow_schema::{DataType, Field, FieldRef, Schema, SchemaRef};
use vspace_core::error::Error;
use vspace_core::Result;

/// The synthetic join column appended to the scalar schema.
pub const OFFSET_COLUMN: &str = "offset";

/// The three column-role assignments a user chooses from their schema's
/// field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roles {
    pub primary_column: String,
    pub version_column: Option<String>,
    pub vector_column: String,
}

/// The user schema plus its three derived schemas, computed once and
/// carried immutably on every [`crate::manifest::Manifest`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaView {
    pub user_schema: SchemaRef,
    pub roles: Roles,
    pub scalar_schema: SchemaRef,
    pub vector_schema: SchemaRef,
    pub delete_schema: SchemaRef,
}

impl SchemaView {
    /// Validate `roles` against `user_schema` and derive the three
    /// projections. Fails with [`Error::SchemaInvalid`] if the primary or
    /// vector column is missing, if a declared version column is absent or
    /// not integer-typed, or if the user schema already declares a field
    /// named [`OFFSET_COLUMN`].
    pub fn derive(user_schema: SchemaRef, roles: Roles) -> Result<Self> {
        let primary_field = find_field(&user_schema, &roles.primary_column).ok_or_else(|| {
            Error::schema_invalid(
                format!("primary column '{}' not found in schema", roles.primary_column),
                snafu::location!(),
            )
        })?;

        let vector_field = find_field(&user_schema, &roles.vector_column).ok_or_else(|| {
            Error::schema_invalid(
                format!("vector column '{}' not found in schema", roles.vector_column),
                snafu::location!(),
            )
        })?;

        let version_field = match &roles.version_column {
            Some(name) => {
                let field = find_field(&user_schema, name).ok_or_else(|| {
                    Error::schema_invalid(
                        format!("version column '{name}' not found in schema"),
                        snafu::location!(),
                    )
                })?;
                if !is_integer(field.data_type()) {
                    return Err(Error::schema_invalid(
                        format!(
                            "version column '{name}' must be an integer type, got {:?}",
                            field.data_type()
                        ),
                        snafu::location!(),
                    ));
                }
                Some(field)
            }
            None => None,
        };

        if find_field(&user_schema, OFFSET_COLUMN).is_some() {
            return Err(Error::schema_invalid(
                format!(
                    "user schema must not declare a field named '{OFFSET_COLUMN}'; \
                     it is reserved for the synthetic scalar/vector join column"
                ),
                snafu::location!(),
            ));
        }

        let scalar_schema = {
            let mut fields: Vec<FieldRef> = user_schema
                .fields()
                .iter()
                .filter(|f| f.name() != &roles.vector_column)
                .cloned()
                .collect();
            fields.push(Arc::new(Field::new(OFFSET_COLUMN, DataType::Int64, false)));
            Arc::new(Schema::new(fields))
        };

        let vector_schema = {
            let mut fields = vec![primary_field.clone()];
            if let Some(vf) = &version_field {
                fields.push(vf.clone());
            }
            fields.push(vector_field.clone());
            Arc::new(Schema::new(fields))
        };

        let delete_schema = {
            let mut fields = vec![primary_field.clone()];
            if let Some(vf) = &version_field {
                fields.push(vf.clone());
            }
            Arc::new(Schema::new(fields))
        };

        Ok(Self {
            user_schema,
            roles,
            scalar_schema,
            vector_schema,
            delete_schema,
        })
    }

    pub fn has_version_column(&self) -> bool {
        self.roles.version_column.is_some()
    }
}

fn find_field(schema: &Schema, name: &str) -> Option<FieldRef> {
    schema.fields().iter().find(|f| f.name() == name).cloned()
}

fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
