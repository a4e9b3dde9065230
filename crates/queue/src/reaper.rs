// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background stall reaper (spec §4.2 "Retry / stall"), spawned once at
//! daemon boot and cancelled via [`CancellationToken`] on drain, matching
//! the teacher's reaper/monitor task shape.

use crate::queue::Queue;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Spawn the stall reaper: every `cadence`, reclaim expired leases across
/// all clusters. Cancelled cooperatively via `cancel`.
pub fn spawn_stall_reaper(
    queue: Arc<Queue>,
    cadence: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cadence);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("stall reaper shutting down");
                    return;
                }
                _ = interval.tick() => {
                    let now_ms = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64;
                    match queue.reap_stalled(now_ms) {
                        Ok(0) => {}
                        Ok(n) => debug!(reclaimed = n, "stall reaper reclaimed expired leases"),
                        Err(err) => warn!(%err, "stall reaper sweep failed"),
                    }
                }
            }
        }
    })
}
