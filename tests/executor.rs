mod common;

use std::num::NonZeroUsize;

use common::{dump_with_rows, RecordingSession};
use sql_batch_loader::batcher::batch;
use sql_batch_loader::config::TransactionMode;
use sql_batch_loader::error::LoadError;
use sql_batch_loader::executor::{InsertSummary, LoadExecutor};
use sql_batch_loader::splitter::split;
use sql_batch_loader::store::BatchFileStore;

fn stored_batches(scratch: &tempfile::TempDir, rows: usize, size: usize) -> BatchFileStore {
    let pair = split(&dump_with_rows(rows)).unwrap();
    let store = BatchFileStore::create(scratch.path().join("batched_sql")).unwrap();
    for b in batch(&pair.insert, NonZeroUsize::new(size).unwrap()).unwrap() {
        store.put(&b).unwrap();
    }
    store
}

#[tokio::test]
async fn create_table_commits() {
    let mut session = RecordingSession::default();
    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    executor.create_table("create table t (a int)").await.unwrap();
    assert_eq!(session.committed, vec!["create table t (a int)"]);
}

#[tokio::test]
async fn failed_create_table_is_rolled_back() {
    let mut session = RecordingSession::failing_on("create table");
    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let err = executor.create_table("create table t (a int)").await.unwrap_err();
    assert!(matches!(err, LoadError::TableCreation { .. }));
    assert!(session.committed.is_empty());
}

#[tokio::test]
async fn failed_rollback_keeps_table_creation_error() {
    let mut session = RecordingSession::disconnecting_on("create table");
    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let err = executor.create_table("create table t (a int)").await.unwrap_err();
    assert!(matches!(err, LoadError::TableCreation { .. }));
}

#[tokio::test]
async fn failed_rollback_keeps_batch_position() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 5, 2);
    let mut session = RecordingSession::disconnecting_on("(3)");

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let err = executor.insert_all(&store, None).await.unwrap_err();
    assert!(matches!(
        err,
        LoadError::BatchInsertion {
            sequence: 2,
            last_applied: Some(1),
            ..
        }
    ));
    assert_eq!(session.attempted_containing("(5)"), 0);
}

#[tokio::test]
async fn per_batch_failure_keeps_earlier_batches() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 5, 2);
    let mut session = RecordingSession::failing_on("(3)");

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let err = executor.insert_all(&store, None).await.unwrap_err();
    match err {
        LoadError::BatchInsertion {
            sequence,
            last_applied,
            ..
        } => {
            assert_eq!(sequence, 2);
            assert_eq!(last_applied, Some(1));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(session.committed.len(), 1);
    assert_eq!(session.committed_containing("(1)"), 1);
    assert_eq!(session.attempted_containing("(5)"), 0);
}

#[tokio::test]
async fn all_or_nothing_rolls_back_everything() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 5, 2);
    let mut session = RecordingSession::failing_on("(5)");

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::AllOrNothing);
    let err = executor.insert_all(&store, None).await.unwrap_err();
    assert!(matches!(
        err,
        LoadError::BatchInsertion {
            sequence: 3,
            last_applied: None,
            ..
        }
    ));
    assert_eq!(session.attempted.len(), 3);
    assert!(session.committed.is_empty());
}

#[tokio::test]
async fn all_or_nothing_commits_once() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 7, 3);
    let mut session = RecordingSession::default();

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::AllOrNothing);
    let summary = executor.insert_all(&store, None).await.unwrap();
    assert_eq!(summary.applied, 3);
    assert_eq!(session.committed.len(), 3);
}

#[tokio::test]
async fn resume_skips_applied_batches() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 5, 2);
    let mut session = RecordingSession::default();

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let summary = executor.insert_all(&store, Some(1)).await.unwrap();
    assert_eq!(
        summary,
        InsertSummary {
            applied: 2,
            skipped: 1,
            last_applied: Some(3),
        }
    );
    assert_eq!(session.attempted_containing("(1)"), 0);
    assert_eq!(
        session.committed,
        vec![
            "insert into t (a) values\n(3),\n(4);\n",
            "insert into t (a) values\n(5);\n",
        ]
    );
}

#[tokio::test]
async fn empty_store_is_a_no_op() {
    let scratch = tempfile::tempdir().unwrap();
    let store = stored_batches(&scratch, 0, 2);
    let mut session = RecordingSession::default();

    let mut executor = LoadExecutor::new(&mut session, TransactionMode::PerBatch);
    let summary = executor.insert_all(&store, None).await.unwrap();
    assert_eq!(summary, InsertSummary::default());
    assert!(session.attempted.is_empty());
}
