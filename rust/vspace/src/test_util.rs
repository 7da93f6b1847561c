// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Shared fixtures for this crate's test suites: a schema with a primary,
//! version, and vector column, plus helpers to build a fresh `Space` and
//! sample batches against it.

use std::sync::Arc;

use arrow_array::{
    ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use vspace_core::Result;
use vspace_format::Roles;

use crate::options::SpaceOpenOptions;
use crate::space::Space;

pub const VECTOR_DIM: i32 = 4;

pub fn user_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("pk", DataType::Int64, false),
        Field::new("ver", DataType::Int64, false),
        Field::new(
            "vec",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), VECTOR_DIM),
            false,
        ),
        Field::new("tag", DataType::Utf8, true),
    ]))
}

pub fn roles() -> Roles {
    Roles {
        primary_column: "pk".to_string(),
        version_column: Some("ver".to_string()),
        vector_column: "vec".to_string(),
    }
}

pub async fn open_space(uri: &str) -> Result<Space> {
    Space::open(SpaceOpenOptions::new(uri).with_create(user_schema(), roles())).await
}

pub async fn reopen(uri: &str, version: Option<u64>) -> Result<Space> {
    let mut options = SpaceOpenOptions::new(uri);
    if let Some(v) = version {
        options = options.with_version(v);
    }
    Space::open(options).await
}

/// A batch of `pk in pks`, `ver` constant, 4-float vectors, and string
/// tags generated from each pk's index.
pub fn sample_batch(pks: &[i64], ver: i64) -> RecordBatch {
    let n = pks.len();
    let pk_array: ArrayRef = Arc::new(Int64Array::from(pks.to_vec()));
    let ver_array: ArrayRef = Arc::new(Int64Array::from(vec![ver; n]));

    let values: Vec<f32> = (0..n * VECTOR_DIM as usize).map(|i| i as f32).collect();
    let vec_array: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            VECTOR_DIM,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .unwrap(),
    );

    let tag_array: ArrayRef = Arc::new(StringArray::from(
        pks.iter().map(|p| format!("t{p}")).collect::<Vec<_>>(),
    ));

    RecordBatch::try_new(user_schema(), vec![pk_array, ver_array, vec_array, tag_array]).unwrap()
}

pub fn delete_batch(pks: &[i64], ver: i64) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("pk", DataType::Int64, false),
        Field::new("ver", DataType::Int64, false),
    ]));
    let pk_array: ArrayRef = Arc::new(Int64Array::from(pks.to_vec()));
    let ver_array: ArrayRef = Arc::new(Int64Array::from(vec![ver; pks.len()]));
    RecordBatch::try_new(schema, vec![pk_array, ver_array]).unwrap()
}
