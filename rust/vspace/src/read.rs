// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! `read`: resolves the file list for a manifest snapshot, builds the
//! delete set, and streams joined, filtered, projected records.
//!
//! Per fragment, the scalar file's `offset` column is the nominal join
//! key with the vector file, but since both files of a fragment are
//! always written in lock-step from the same slice of the same write call
//! (see `writer::write`), row `i` of the scalar file already corresponds
//! to row `i` of the vector file; joining is therefore positional, with
//! the row-count equality check standing in for the offset-based join.

use std::cmp::Ordering;
use std::sync::Arc;

use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
};
use arrow_schema::{DataType, Schema, SchemaRef};
use arrow_select::concat::concat_batches;
use arrow_select::filter::filter_record_batch;
use futures::TryStreamExt;
use tracing::instrument;
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_format::schema::SchemaView;
use vspace_io::VspaceStore;

use crate::delete_set::{primary_keys_from_array, DeleteSet};
use crate::options::{Filter, FilterValue, ReadOptions};
use crate::space::Space;
use crate::RecordBatchStream;

/// Materialize every live, filtered, projected row visible at the
/// manifest snapshot current when this call starts, as a stream of
/// already-resolved batches (one per scalar/vector file pair).
#[instrument(skip(space, options))]
pub async fn read(space: &Space, options: ReadOptions) -> Result<RecordBatchStream> {
    let manifest = space.current_manifest().await;
    let schema_view = manifest.schema.clone();

    validate_columns(&schema_view.user_schema, options.columns.as_deref())?;

    let mut filters = options.filters.clone();
    let mut columns = options.columns.clone();

    if let Some(version_column) = schema_view.roles.version_column.clone() {
        match options.version {
            Some(v) => filters.push(Filter::Le(version_column, FilterValue::Int64(v))),
            None => {
                filters.push(Filter::Le(version_column.clone(), FilterValue::Int64(i64::MAX)));
                if let Some(cols) = columns.as_mut() {
                    if !cols.iter().any(|c| c == &version_column) {
                        cols.push(version_column);
                    }
                }
            }
        }
    }

    let delete_set = DeleteSet::build(space.store(), &manifest).await?;

    let mut out_batches = Vec::new();
    for scalar_fragment in &manifest.scalar_fragments {
        let vector_fragment = manifest
            .vector_fragments
            .iter()
            .find(|f| f.id == scalar_fragment.id)
            .ok_or_else(|| {
                Error::manifest_corrupt(
                    format!("scalar fragment {} has no matching vector fragment", scalar_fragment.id),
                    snafu::location!(),
                )
            })?;

        if scalar_fragment.files.len() != vector_fragment.files.len() {
            return Err(Error::manifest_corrupt(
                format!(
                    "fragment {} has {} scalar files but {} vector files",
                    scalar_fragment.id,
                    scalar_fragment.files.len(),
                    vector_fragment.files.len()
                ),
                snafu::location!(),
            ));
        }

        for (scalar_file, vector_file) in scalar_fragment.files.iter().zip(vector_fragment.files.iter()) {
            let scalar_batch = read_whole_file(space.store(), scalar_file, &schema_view.scalar_schema).await?;
            let vector_batch = read_whole_file(space.store(), vector_file, &schema_view.vector_schema).await?;

            let joined = join_by_position(&scalar_batch, &vector_batch, &schema_view)?;
            let live = apply_delete_set(&joined, &schema_view, &delete_set)?;
            let filtered = apply_filters(&live, &filters)?;
            let projected = apply_projection(&filtered, &schema_view.user_schema, columns.as_deref())?;

            if projected.num_rows() > 0 {
                out_batches.push(Ok(projected));
            }
        }
    }

    Ok(Box::pin(tokio_stream::iter(out_batches)))
}

fn validate_columns(user_schema: &SchemaRef, columns: Option<&[String]>) -> Result<()> {
    let Some(columns) = columns else {
        return Ok(());
    };
    for name in columns {
        if user_schema.index_of(name).is_err() {
            return Err(Error::schema_invalid(
                format!("projected column '{name}' is not part of the user schema"),
                snafu::location!(),
            ));
        }
    }
    Ok(())
}

async fn read_whole_file(store: &VspaceStore, file: &str, schema: &SchemaRef) -> Result<RecordBatch> {
    let path = store.join(file);
    let builder = store.parquet_reader_builder(&path).await?;
    let mut stream = builder.build()?;
    let mut batches = Vec::new();
    while let Some(batch) = stream.try_next().await? {
        batches.push(batch);
    }
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema.clone()));
    }
    concat_batches(schema, &batches).map_err(Error::from)
}

fn join_by_position(
    scalar_batch: &RecordBatch,
    vector_batch: &RecordBatch,
    schema_view: &SchemaView,
) -> Result<RecordBatch> {
    if scalar_batch.num_rows() != vector_batch.num_rows() {
        return Err(Error::manifest_corrupt(
            format!(
                "scalar file has {} rows but its paired vector file has {}",
                scalar_batch.num_rows(),
                vector_batch.num_rows()
            ),
            snafu::location!(),
        ));
    }

    let user_schema = &schema_view.user_schema;
    let mut columns = Vec::with_capacity(user_schema.fields().len());
    for field in user_schema.fields() {
        if field.name() == &schema_view.roles.vector_column {
            let idx = vector_batch.schema().index_of(field.name())?;
            columns.push(vector_batch.column(idx).clone());
        } else {
            let idx = scalar_batch.schema().index_of(field.name())?;
            columns.push(scalar_batch.column(idx).clone());
        }
    }
    RecordBatch::try_new(user_schema.clone(), columns).map_err(Error::from)
}

fn apply_delete_set(batch: &RecordBatch, schema_view: &SchemaView, delete_set: &DeleteSet) -> Result<RecordBatch> {
    if delete_set.is_empty() {
        return Ok(batch.clone());
    }

    let primary_idx = batch.schema().index_of(&schema_view.roles.primary_column)?;
    let keys = primary_keys_from_array(batch.column(primary_idx))?;

    let versions: Option<Int64Array> = match &schema_view.roles.version_column {
        Some(name) => {
            let idx = batch.schema().index_of(name)?;
            Some(cast_to_i64(batch.column(idx))?)
        }
        None => None,
    };

    let mask: Vec<bool> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let live_version = versions.as_ref().and_then(|v| v.is_valid(i).then(|| v.value(i)));
            delete_set.is_visible(key, live_version)
        })
        .collect();

    filter_record_batch(batch, &BooleanArray::from(mask)).map_err(Error::from)
}

fn apply_filters(batch: &RecordBatch, filters: &[Filter]) -> Result<RecordBatch> {
    if filters.is_empty() {
        return Ok(batch.clone());
    }

    let mut mask = vec![true; batch.num_rows()];
    for filter in filters {
        let idx = batch.schema().index_of(filter.column())?;
        let array = batch.column(idx);
        let filter_mask = eval_filter(array, filter)?;
        for (keep, matched) in mask.iter_mut().zip(filter_mask.into_iter()) {
            *keep = *keep && matched;
        }
    }

    filter_record_batch(batch, &BooleanArray::from(mask)).map_err(Error::from)
}

fn eval_filter(array: &ArrayRef, filter: &Filter) -> Result<Vec<bool>> {
    match filter {
        Filter::Eq(_, v) => compare_mask(array, v, |ord| ord == Ordering::Equal),
        Filter::Ne(_, v) => compare_mask(array, v, |ord| ord != Ordering::Equal),
        Filter::Lt(_, v) => compare_mask(array, v, |ord| ord == Ordering::Less),
        Filter::Le(_, v) => compare_mask(array, v, |ord| ord != Ordering::Greater),
        Filter::Gt(_, v) => compare_mask(array, v, |ord| ord == Ordering::Greater),
        Filter::Ge(_, v) => compare_mask(array, v, |ord| ord != Ordering::Less),
        Filter::In(_, values) => {
            let mut mask = vec![false; array.len()];
            for v in values {
                let m = compare_mask(array, v, |ord| ord == Ordering::Equal)?;
                for (keep, matched) in mask.iter_mut().zip(m) {
                    *keep = *keep || matched;
                }
            }
            Ok(mask)
        }
    }
}

fn compare_mask(array: &ArrayRef, literal: &FilterValue, matches: impl Fn(Ordering) -> bool) -> Result<Vec<bool>> {
    match literal {
        FilterValue::Int64(v) => {
            let casted = cast_to_i64(array)?;
            Ok((0..casted.len())
                .map(|i| casted.is_valid(i) && matches(casted.value(i).cmp(v)))
                .collect())
        }
        FilterValue::Float64(v) => {
            let casted = arrow_cast::cast(array, &DataType::Float64)?;
            let arr = casted
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("cast to Float64 succeeded");
            Ok((0..arr.len())
                .map(|i| {
                    arr.is_valid(i)
                        && arr
                            .value(i)
                            .partial_cmp(v)
                            .map(&matches)
                            .unwrap_or(false)
                })
                .collect())
        }
        FilterValue::Utf8(v) => {
            let arr = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| Error::schema_mismatch("filter literal is Utf8 but the column is not", snafu::location!()))?;
            Ok((0..arr.len())
                .map(|i| arr.is_valid(i) && matches(arr.value(i).cmp(v.as_str())))
                .collect())
        }
        FilterValue::Bool(v) => {
            let arr = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| Error::schema_mismatch("filter literal is Bool but the column is not", snafu::location!()))?;
            Ok((0..arr.len())
                .map(|i| arr.is_valid(i) && matches(arr.value(i).cmp(v)))
                .collect())
        }
    }
}

fn cast_to_i64(array: &ArrayRef) -> Result<Int64Array> {
    let casted = arrow_cast::cast(array, &DataType::Int64)?;
    Ok(Int64Array::from(casted.to_data()))
}

fn apply_projection(batch: &RecordBatch, user_schema: &SchemaRef, columns: Option<&[String]>) -> Result<RecordBatch> {
    let Some(columns) = columns else {
        return Ok(batch.clone());
    };

    let mut fields = Vec::new();
    let mut arrays = Vec::new();
    for field in user_schema.fields() {
        if columns.iter().any(|c| c == field.name()) {
            let idx = batch.schema().index_of(field.name())?;
            fields.push(field.clone());
            arrays.push(batch.column(idx).clone());
        }
    }
    let projected_schema = Arc::new(Schema::new(fields));
    RecordBatch::try_new(projected_schema, arrays).map_err(Error::from)
}
