// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! `delete`: writes a tombstone batch stream into a single delete file and
//! publishes it as a new delete fragment.

use futures::TryStreamExt;
use tracing::{debug, instrument};
use vspace_core::error::Error;
use vspace_core::Result;
use vspace_format::{paths, Fragment};

use crate::space::Space;
use crate::RecordBatchStream;

/// Consume `stream`, whose schema must equal the space's delete schema,
/// appending every non-empty batch into one delete file. On stream end,
/// publishes a new manifest with one appended delete fragment. An empty
/// stream is a no-op.
#[instrument(skip(space, stream))]
pub async fn delete(space: &Space, mut stream: RecordBatchStream) -> Result<()> {
    let manifest = space.current_manifest().await;
    let delete_schema = manifest.schema.delete_schema.clone();

    let mut writer: Option<
        parquet::arrow::async_writer::AsyncArrowWriter<parquet::arrow::async_writer::ParquetObjectWriter>,
    > = None;
    let mut fragment = Fragment::new(manifest.version as i64);

    while let Some(batch) = stream.try_next().await? {
        if batch.num_rows() == 0 {
            continue;
        }
        if batch.schema().as_ref() != delete_schema.as_ref() {
            return Err(Error::schema_mismatch(
                "delete batch schema does not match the space's delete schema",
                snafu::location!(),
            ));
        }

        if writer.is_none() {
            let path = paths::new_delete_file_path();
            fragment.files.push(path.clone());
            writer = Some(
                space
                    .store()
                    .parquet_writer(&space.store().join(&path), delete_schema.clone())?,
            );
        }
        writer.as_mut().expect("opened above").write(&batch).await?;
    }

    let Some(writer) = writer else {
        debug!("delete stream produced no rows; no-op");
        return Ok(());
    };
    writer.close().await?;

    space
        .publish(move |current, version| current.with_new_version(version, None, None, Some(fragment.clone())))
        .await?;

    Ok(())
}
