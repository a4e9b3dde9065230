use super::*;
use acp_core::{Cluster, ClusterId};
use tempfile::tempdir;

fn test_op(name: &str) -> Op {
    Op::ClusterUpserted(Cluster::new(ClusterId::new("cls_1"), name))
}

#[test]
fn open_creates_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");

    let wal = Wal::open(&path, 0).unwrap();

    assert!(path.exists());
    assert_eq!(wal.write_seq(), 0);
    assert_eq!(wal.processed_seq(), 0);
}

#[test]
fn append_and_flush() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal = Wal::open(&path, 0).unwrap();

    let seq1 = wal.append(&test_op("a")).unwrap();
    let seq2 = wal.append(&test_op("b")).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);

    wal.flush().unwrap();
    let metadata = std::fs::metadata(&path).unwrap();
    assert!(metadata.len() > 0);
}

#[test]
fn next_unprocessed_yields_entries_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal = Wal::open(&path, 0).unwrap();

    wal.append(&test_op("a")).unwrap();
    wal.append(&test_op("b")).unwrap();
    wal.flush().unwrap();

    let entry1 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry1.seq, 1);
    let entry2 = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry2.seq, 2);
    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn mark_processed_advances_watermark() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    let mut wal = Wal::open(&path, 0).unwrap();

    wal.append(&test_op("a")).unwrap();
    wal.flush().unwrap();
    let entry = wal.next_unprocessed().unwrap().unwrap();
    wal.mark_processed(entry.seq);

    assert_eq!(wal.processed_seq(), 1);
}

#[test]
fn reopen_with_processed_seq_skips_already_applied_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.wal");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&test_op("a")).unwrap();
        wal.append(&test_op("b")).unwrap();
        wal.append(&test_op("c")).unwrap();
        wal.flush().unwrap();
    }

    let mut wal = Wal::open(&path, 2).unwrap();
    assert_eq!(wal.write_seq(), 3);
    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 3);
    assert!(wal.next_unprocessed().unwrap().is_none());
}
