// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Store`]: the single point of contact between the rest of the control
//! plane and durable state. Every mutation goes through [`Store::apply`],
//! which appends the op to the WAL, flushes it, then folds it into the
//! in-memory [`MaterializedState`] — in that order, so a crash between
//! append and fold just means the op replays on next boot.

use crate::error::StoreError;
use crate::op::Op;
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::wal::Wal;
use acp_core::{Blob, BlobContentType, BlobId, ClusterId, Job, JobId, MachineId};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// WAL entries between automatic snapshots. Chosen to bound replay time on
/// restart without snapshotting on every write.
const SNAPSHOT_EVERY_N_OPS: u64 = 1_000;

pub struct Store {
    inner: Arc<Mutex<Inner>>,
    dir: PathBuf,
}

struct Inner {
    wal: Wal,
    state: MaterializedState,
    ops_since_snapshot: u64,
}

impl Store {
    /// Open (or create) a store rooted at `dir`: `dir/state.wal` and
    /// `dir/snapshot.zst`. Replays the WAL past the snapshot's watermark on
    /// open so the returned `Store` reflects every previously accepted op.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        fs::create_dir_all(dir.join("blobs"))?;

        let snapshot_path = dir.join("snapshot.zst");
        let snapshot = Snapshot::load(&snapshot_path)?;

        let (mut state, processed_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(dir.join("state.wal"), processed_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply(&entry.op);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        if replayed > 0 {
            info!(replayed, "replayed wal entries on store open");
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner { wal, state, ops_since_snapshot: 0 })),
            dir,
        })
    }

    /// Append `op`, fold it into state, and return a read-only snapshot of
    /// the resulting [`MaterializedState`] (clone; callers should avoid this
    /// on hot paths and instead use [`Store::with_state`]).
    pub fn apply(&self, op: Op) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.append(&op)?;
        inner.wal.flush()?;
        inner.state.apply(&op);
        inner.ops_since_snapshot += 1;
        if inner.ops_since_snapshot >= SNAPSHOT_EVERY_N_OPS {
            self.snapshot_locked(&mut inner)?;
        }
        Ok(())
    }

    /// Read-only access to the materialized state under the store's lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.state)
    }

    /// Atomically select up to `limit` claimable jobs in `cluster_id`
    /// matching `predicate`, oldest first, and claim them for
    /// `machine_id` — selection and mutation happen under one lock
    /// acquisition so concurrent pollers never double-claim the same job
    /// (spec §4.1: "claim N pending jobs" safe under concurrency).
    pub fn claim_jobs(
        &self,
        cluster_id: &ClusterId,
        predicate: impl Fn(&Job) -> bool,
        machine_id: &MachineId,
        limit: usize,
        now_ms: u64,
    ) -> Result<Vec<Job>, StoreError> {
        let mut inner = self.inner.lock();

        let mut candidates: Vec<&Job> = inner
            .state
            .jobs
            .values()
            .filter(|j| j.cluster_id == *cluster_id && j.is_claimable() && predicate(j))
            .collect();
        candidates.sort_by_key(|j| j.created_at_ms);
        let job_ids: Vec<JobId> = candidates.into_iter().take(limit).map(|j| j.id.clone()).collect();

        let mut claimed = Vec::with_capacity(job_ids.len());
        for job_id in job_ids {
            let op = Op::JobClaimed {
                cluster_id: cluster_id.clone(),
                job_id: job_id.clone(),
                machine_id: machine_id.clone(),
                now_ms,
            };
            inner.wal.append(&op)?;
            inner.state.apply(&op);
            inner.ops_since_snapshot += 1;
            if let Some(job) = inner.state.get_job(cluster_id, &job_id) {
                claimed.push(job.clone());
            }
        }
        inner.wal.flush()?;
        if inner.ops_since_snapshot >= SNAPSHOT_EVERY_N_OPS {
            self.snapshot_locked(&mut inner)?;
        }
        Ok(claimed)
    }

    pub fn snapshot_now(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        self.snapshot_locked(&mut inner)
    }

    fn snapshot_locked(&self, inner: &mut Inner) -> Result<(), StoreError> {
        let seq = inner.wal.write_seq();
        let now_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
        let snapshot = Snapshot::new(seq, inner.state.clone(), now_ms);
        snapshot.save(self.dir.join("snapshot.zst"))?;
        inner.wal.mark_processed(seq);
        inner.ops_since_snapshot = 0;
        Ok(())
    }

    /// Write blob content to the content-addressed blob directory and
    /// record its metadata, returning the registered [`Blob`].
    pub fn put_blob(
        &self,
        cluster_id: ClusterId,
        content_type: BlobContentType,
        bytes: &[u8],
        now_ms: u64,
    ) -> Result<Blob, StoreError> {
        let blob = Blob::new(cluster_id, content_type, bytes.len() as u64, now_ms);
        fs::write(self.blob_path(&blob.id), bytes).map_err(StoreError::Blob)?;
        self.apply(Op::BlobRegistered(Box::new(blob.clone())))?;
        Ok(blob)
    }

    pub fn get_blob_bytes(&self, blob_id: &BlobId) -> Result<Vec<u8>, StoreError> {
        fs::read(self.blob_path(blob_id)).map_err(StoreError::Blob)
    }

    fn blob_path(&self, blob_id: &BlobId) -> PathBuf {
        self.dir.join("blobs").join(blob_id.as_str())
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), dir: self.dir.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_core::{Cluster, ClusterId};
    use tempfile::tempdir;

    #[test]
    fn apply_persists_and_state_reflects_it() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.apply(Op::ClusterUpserted(Cluster::new(ClusterId::new("cls"), "acme"))).unwrap();

        store.with_state(|s| {
            assert_eq!(s.clusters.get(&ClusterId::new("cls")).unwrap().name, "acme");
        });
    }

    #[test]
    fn reopening_replays_wal_into_fresh_state() {
        let dir = tempdir().unwrap();
        {
            let store = Store::open(dir.path()).unwrap();
            store
                .apply(Op::ClusterUpserted(Cluster::new(ClusterId::new("cls"), "acme")))
                .unwrap();
        }

        let store = Store::open(dir.path()).unwrap();
        store.with_state(|s| {
            assert_eq!(s.clusters.len(), 1);
        });
    }

    #[test]
    fn put_and_get_blob_round_trips_bytes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let blob = store
            .put_blob(ClusterId::new("cls"), BlobContentType::ApplicationJson, b"{\"a\":1}", 0)
            .unwrap();
        let bytes = store.get_blob_bytes(&blob.id).unwrap();
        assert_eq!(bytes, b"{\"a\":1}");
    }

    #[test]
    fn snapshot_now_captures_state_at_current_seq() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store.apply(Op::ClusterUpserted(Cluster::new(ClusterId::new("cls"), "acme"))).unwrap();
        store.snapshot_now().unwrap();

        let reopened = Store::open(dir.path()).unwrap();
        reopened.with_state(|s| assert_eq!(s.clusters.len(), 1));
    }

    #[test]
    fn claim_jobs_respects_limit_and_marks_running() {
        use acp_core::{JobConfig, ToolConfig};

        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let cluster_id = ClusterId::new("cls");
        for i in 0..3 {
            let job = acp_core::Job::new(
                acp_core::JobId::new(format!("job_{i}")),
                JobConfig {
                    cluster_id: cluster_id.clone(),
                    run_id: None,
                    workflow_execution_id: None,
                    target_fn: "echo".into(),
                    target_args: serde_json::json!({}),
                    tool_config: ToolConfig::default(),
                    cache_key: None,
                    auth_context: None,
                    run_context: None,
                },
                i,
            );
            store.apply(Op::JobCreated(Box::new(job))).unwrap();
        }

        let claimed = store
            .claim_jobs(
                &cluster_id,
                |_| true,
                &acp_core::MachineId::new("mch_1"),
                2,
                1_000,
            )
            .unwrap();

        assert_eq!(claimed.len(), 2);
        assert!(claimed.iter().all(|j| j.status == acp_core::JobStatus::Running));
        assert_eq!(claimed[0].id.as_str(), "job_0");
        assert_eq!(claimed[1].id.as_str(), "job_1");
    }
}
