// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! End-to-end scenarios against a real temp-dir `file://` Space, exercising
//! the full open/write/delete/read/blob surface together rather than one
//! pipeline stage at a time.

use std::sync::Arc;

use arrow_array::{ArrayRef, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use futures::{stream, StreamExt};

use vspace::{delete, read, write, ReadOptions, Space, SpaceOpenOptions, WriteOptions};
use vspace_format::Roles;

const DIM: i32 = 4;

fn user_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("pk", DataType::Int64, false),
        Field::new("ver", DataType::Int64, false),
        Field::new(
            "vec",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), DIM),
            false,
        ),
        Field::new("tag", DataType::Utf8, true),
    ]))
}

fn roles() -> Roles {
    Roles {
        primary_column: "pk".to_string(),
        version_column: Some("ver".to_string()),
        vector_column: "vec".to_string(),
    }
}

fn batch(pks: &[i64], ver: i64) -> RecordBatch {
    let n = pks.len();
    let pk: ArrayRef = Arc::new(Int64Array::from(pks.to_vec()));
    let verr: ArrayRef = Arc::new(Int64Array::from(vec![ver; n]));
    let values: Vec<f32> = (0..n * DIM as usize).map(|i| i as f32).collect();
    let vec: ArrayRef = Arc::new(
        FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            DIM,
            Arc::new(Float32Array::from(values)),
            None,
        )
        .unwrap(),
    );
    let tag: ArrayRef = Arc::new(StringArray::from(
        pks.iter().map(|p| format!("t{p}")).collect::<Vec<_>>(),
    ));
    RecordBatch::try_new(user_schema(), vec![pk, verr, vec, tag]).unwrap()
}

fn delete_batch(pks: &[i64], ver: i64) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("pk", DataType::Int64, false),
        Field::new("ver", DataType::Int64, false),
    ]));
    let pk: ArrayRef = Arc::new(Int64Array::from(pks.to_vec()));
    let verr: ArrayRef = Arc::new(Int64Array::from(vec![ver; pks.len()]));
    RecordBatch::try_new(schema, vec![pk, verr]).unwrap()
}

fn as_stream(batches: Vec<RecordBatch>) -> vspace::RecordBatchStream {
    Box::pin(stream::iter(batches.into_iter().map(Ok)))
}

async fn open_fresh(uri: &str) -> Space {
    Space::open(SpaceOpenOptions::new(uri).with_create(user_schema(), roles()))
        .await
        .unwrap()
}

async fn pks_of(space: &Space, options: ReadOptions) -> Vec<i64> {
    let mut rows: Vec<i64> = read(space, options)
        .await
        .unwrap()
        .flat_map(|b| {
            let batch = b.unwrap();
            let idx = batch.schema().index_of("pk").unwrap();
            let arr = batch.column(idx).as_any().downcast_ref::<Int64Array>().unwrap().clone();
            stream::iter(arr.iter().flatten().collect::<Vec<_>>())
        })
        .collect()
        .await;
    rows.sort_unstable();
    rows
}

/// Scenario 1: create & first write.
#[tokio::test]
async fn create_and_first_write() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    write(&space, as_stream(vec![batch(&[1, 2, 3], 10)]), WriteOptions { max_record_per_file: 10 })
        .await
        .unwrap();

    let manifest = space.current_manifest().await;
    assert_eq!(manifest.version, 1);
    assert_eq!(manifest.scalar_fragments.len(), 1);
    assert_eq!(manifest.vector_fragments.len(), 1);
    assert_eq!(manifest.scalar_fragments[0].files.len(), 1);
    assert_eq!(manifest.vector_fragments[0].files.len(), 1);
    assert_eq!(pks_of(&space, ReadOptions::default()).await, vec![1, 2, 3]);
}

/// Scenario 2: roll-over across several files, order preserved, no rows lost.
#[tokio::test]
async fn roll_over_preserves_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    let pks: Vec<i64> = (0..25).collect();
    write(&space, as_stream(vec![batch(&pks, 1)]), WriteOptions { max_record_per_file: 10 })
        .await
        .unwrap();

    let manifest = space.current_manifest().await;
    assert_eq!(manifest.scalar_fragments[0].files.len(), 3);
    assert_eq!(manifest.vector_fragments[0].files.len(), 3);
    assert_eq!(pks_of(&space, ReadOptions::default()).await, pks);
}

/// Scenario 3: delete then read.
#[tokio::test]
async fn delete_then_read_hides_the_tombstoned_key() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    write(&space, as_stream(vec![batch(&[1, 2, 3], 10)]), WriteOptions::default())
        .await
        .unwrap();
    delete(&space, as_stream(vec![delete_batch(&[2], 11)])).await.unwrap();

    assert_eq!(pks_of(&space, ReadOptions::default()).await, vec![1, 3]);
}

/// Scenario 4: version pinning. Opening at the version before the delete
/// must not observe it.
#[tokio::test]
async fn version_pinned_open_does_not_see_a_later_delete() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    write(&space, as_stream(vec![batch(&[1, 2, 3], 10)]), WriteOptions::default())
        .await
        .unwrap();
    delete(&space, as_stream(vec![delete_batch(&[2], 11)])).await.unwrap();

    let pinned = Space::open(SpaceOpenOptions::new(&uri).with_version(1)).await.unwrap();
    assert_eq!(pks_of(&pinned, ReadOptions::default()).await, vec![1, 2, 3]);
}

/// Scenario 5: blob roundtrip and replace semantics.
#[tokio::test]
async fn blob_roundtrip_and_replace_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    vspace::write_blob(&space, b"hello", "greet", false).await.unwrap();
    assert_eq!(space.current_manifest().await.version, 1);

    let err = vspace::write_blob(&space, b"nope", "greet", false).await.unwrap_err();
    assert!(matches!(err, vspace_core::Error::BlobAlreadyExists { .. }));

    vspace::write_blob(&space, b"world", "greet", true).await.unwrap();
    assert_eq!(space.current_manifest().await.version, 2);
    assert_eq!(vspace::read_blob(&space, "greet").await.unwrap().as_ref(), b"world");
}

/// Scenario 6: schema mismatch raises synchronously and publishes nothing.
#[tokio::test]
async fn schema_mismatch_write_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    let wrong_schema = Arc::new(Schema::new(vec![Field::new("only_field", DataType::Int64, false)]));
    let wrong_batch = RecordBatch::try_new(
        wrong_schema,
        vec![Arc::new(Int64Array::from(vec![1])) as ArrayRef],
    )
    .unwrap();

    let err = write(&space, as_stream(vec![wrong_batch]), WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, vspace_core::Error::SchemaMismatch { .. }));
    assert_eq!(space.current_manifest().await.version, 0);
}

/// Boundary: two writers racing on the same in-process Space each get a
/// distinct version, and the final version count equals the number of
/// successful writes -- no two publishes land on the same version, and
/// neither is silently dropped.
#[tokio::test]
async fn concurrent_writers_each_land_a_distinct_version() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    let a = write(&space, as_stream(vec![batch(&[1], 10)]), WriteOptions::default());
    let b = write(&space, as_stream(vec![batch(&[2], 10)]), WriteOptions::default());
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    let manifest = space.current_manifest().await;
    assert_eq!(manifest.version, 2);
    assert_eq!(manifest.scalar_fragments.len(), 2);
    assert_eq!(manifest.vector_fragments.len(), 2);
    let ids: Vec<i64> = manifest.scalar_fragments.iter().map(|f| f.id).collect();
    assert_ne!(ids[0], ids[1]);
    assert_eq!(pks_of(&space, ReadOptions::default()).await, vec![1, 2]);
}

/// Boundary: `max_record_per_file = 1` forces one file per row.
#[tokio::test]
async fn max_record_per_file_one_forces_one_file_per_row() {
    let dir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", dir.path().display());
    let space = open_fresh(&uri).await;

    write(&space, as_stream(vec![batch(&[1, 2, 3], 10)]), WriteOptions { max_record_per_file: 1 })
        .await
        .unwrap();

    let manifest = space.current_manifest().await;
    assert_eq!(manifest.scalar_fragments[0].files.len(), 3);
    assert_eq!(manifest.vector_fragments[0].files.len(), 3);
}
