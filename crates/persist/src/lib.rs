//! Persistence: plain-text world snapshots and a hash-chained snapshot store.
//!
//! # Invariants
//! - A written snapshot read back yields a field-for-field identical world
//!   and an identical event list.
//! - Stored snapshots are verifiable; verification failures are errors.

pub mod snapshot;
pub mod store;

pub use snapshot::{SNAPSHOT_VERSION, Snapshot, SnapshotError};
pub use store::{IntegrityManifest, ManifestEntry, SnapshotStore, StoreError, StoreMeta};
