// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! acp-store: durable, replayable state for the agent control plane.
//!
//! Every mutation is first appended to a write-ahead log as an [`Op`], then
//! folded into an in-memory [`MaterializedState`]. Snapshots periodically
//! checkpoint that state so restart doesn't have to replay the log from
//! scratch. [`Store`] is the single entry point the rest of the control
//! plane uses; nothing outside this crate touches the WAL, snapshot file, or
//! blob directory directly.

pub mod error;
pub mod op;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod wal;

pub use error::StoreError;
pub use op::Op;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use store::Store;
pub use wal::{Wal, WalEntry, WalError};
