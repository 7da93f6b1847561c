// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! `write`: splits an incoming record-batch stream into the scalar and
//! vector column groups, rolls files at a row threshold, and publishes the
//! new fragments under the Space write lock.

use std::sync::Arc;

use arrow_array::{Int64Array, RecordBatch};
use futures::TryStreamExt;
use tracing::{debug, instrument};
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_format::schema::{SchemaView, OFFSET_COLUMN};
use vspace_format::{paths, Fragment};

use crate::options::WriteOptions;
use crate::space::Space;
use crate::RecordBatchStream;

type ParquetWriter = parquet::arrow::async_writer::AsyncArrowWriter<parquet::arrow::async_writer::ParquetObjectWriter>;

/// Consume `stream` and publish exactly one new scalar fragment and one
/// new vector fragment -- or, on failure, no manifest change at all. An
/// empty stream (no non-empty batch) is a no-op: no files are opened and
/// `version` is unchanged.
#[instrument(skip(space, stream, options))]
pub async fn write(space: &Space, mut stream: RecordBatchStream, options: WriteOptions) -> Result<()> {
    let manifest = space.current_manifest().await;
    let schema_view = manifest.schema.clone();
    let user_schema = schema_view.user_schema.clone();
    let max_record_per_file = options.max_record_per_file.max(1);

    let mut scalar_writer: Option<ParquetWriter> = None;
    let mut vector_writer: Option<ParquetWriter> = None;
    let mut scalar_fragment = Fragment::new(manifest.version as i64);
    let mut vector_fragment = Fragment::new(manifest.version as i64);
    let mut rows_in_current_file: u64 = 0;

    while let Some(batch) = stream.try_next().await? {
        if batch.num_rows() == 0 {
            continue;
        }
        if batch.schema().as_ref() != user_schema.as_ref() {
            return Err(Error::schema_mismatch(
                "write batch schema does not match the space's user schema",
                snafu::location!(),
            ));
        }

        let mut consumed = 0usize;
        while consumed < batch.num_rows() {
            let remaining_capacity = (max_record_per_file - rows_in_current_file) as usize;
            let take = remaining_capacity.min(batch.num_rows() - consumed);
            let slice = batch.slice(consumed, take);

            if scalar_writer.is_none() {
                let path = paths::new_scalar_file_path();
                scalar_fragment.files.push(path.clone());
                scalar_writer = Some(space.store().parquet_writer(
                    &space.store().join(&path),
                    schema_view.scalar_schema.clone(),
                )?);
            }
            if vector_writer.is_none() {
                let path = paths::new_vector_file_path();
                vector_fragment.files.push(path.clone());
                vector_writer = Some(space.store().parquet_writer(
                    &space.store().join(&path),
                    schema_view.vector_schema.clone(),
                )?);
            }

            let scalar_chunk = project_scalar(&slice, &schema_view, rows_in_current_file as i64)?;
            let vector_chunk = project_vector(&slice, &schema_view)?;

            scalar_writer.as_mut().expect("opened above").write(&scalar_chunk).await?;
            vector_writer.as_mut().expect("opened above").write(&vector_chunk).await?;

            rows_in_current_file += take as u64;
            consumed += take;

            if rows_in_current_file >= max_record_per_file {
                close_pair(&mut scalar_writer, &mut vector_writer).await?;
                rows_in_current_file = 0;
            }
        }
    }

    close_pair(&mut scalar_writer, &mut vector_writer).await?;

    if scalar_fragment.files.is_empty() {
        debug!("write stream produced no rows; no-op");
        return Ok(());
    }

    space
        .publish(move |current, version| {
            current.with_new_version(version, Some(scalar_fragment.clone()), Some(vector_fragment.clone()), None)
        })
        .await?;

    Ok(())
}

async fn close_pair(scalar: &mut Option<ParquetWriter>, vector: &mut Option<ParquetWriter>) -> Result<()> {
    if let Some(w) = scalar.take() {
        w.close().await?;
    }
    if let Some(w) = vector.take() {
        w.close().await?;
    }
    Ok(())
}

/// Project the incoming slice onto the scalar schema (every field except
/// the vector column) and append the synthetic `offset` column, a
/// per-file row counter starting at `offset_start` -- it resets to 0 only
/// when a new scalar file is opened, not at every batch boundary.
fn project_scalar(batch: &RecordBatch, schema_view: &SchemaView, offset_start: i64) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(schema_view.scalar_schema.fields().len());
    for field in schema_view.scalar_schema.fields() {
        if field.name() == OFFSET_COLUMN {
            let offsets: Int64Array =
                (offset_start..offset_start + batch.num_rows() as i64).collect();
            columns.push(Arc::new(offsets) as _);
        } else {
            let idx = batch.schema().index_of(field.name())?;
            columns.push(batch.column(idx).clone());
        }
    }
    RecordBatch::try_new(schema_view.scalar_schema.clone(), columns).map_err(Error::from)
}

fn project_vector(batch: &RecordBatch, schema_view: &SchemaView) -> Result<RecordBatch> {
    let mut columns = Vec::with_capacity(schema_view.vector_schema.fields().len());
    for field in schema_view.vector_schema.fields() {
        let idx = batch.schema().index_of(field.name())?;
        columns.push(batch.column(idx).clone());
    }
    RecordBatch::try_new(schema_view.vector_schema.clone(), columns).map_err(Error::from)
}
