// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-cluster wake-up signal for long-polling `listJobs` callers (spec
//! §4.2 step 3). Correctness never depends on a notification arriving — see
//! [`crate::queue::Queue::list_jobs`]'s fallback poll.

use acp_core::ClusterId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
pub struct NotifierRegistry {
    by_cluster: Mutex<HashMap<ClusterId, Arc<Notify>>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cluster_id: &ClusterId) -> Arc<Notify> {
        let mut guard = self.by_cluster.lock();
        guard.entry(cluster_id.clone()).or_insert_with(|| Arc::new(Notify::new())).clone()
    }

    pub fn wake(&self, cluster_id: &ClusterId) {
        if let Some(notify) = self.by_cluster.lock().get(cluster_id) {
            notify.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wake_resolves_a_waiting_notified_future() {
        let registry = NotifierRegistry::new();
        let cluster_id = ClusterId::new("cls");
        let notify = registry.get(&cluster_id);

        let waiter = tokio::spawn(async move { notify.notified().await });
        tokio::task::yield_now().await;
        registry.wake(&cluster_id);

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
