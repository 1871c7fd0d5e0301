//! Entry synchronization and dual persistence for keepsake.
//!
//! This crate reconciles a local offline cache with a remote authoritative
//! store behind a single [`EntryStore`] contract:
//!
//! - **Remote preferred**: when the remote backend is configured and
//!   reachable it is the source of truth; every successful read and write
//!   is mirrored into the local cache (write-through) so the last-known
//!   entries survive the next offline reload.
//! - **Silent degradation**: a remote failure during load falls back to the
//!   local cache without surfacing an error; the user must still see their
//!   entries.
//! - **Local-only mode**: with no remote configured, the local cache is the
//!   sole persistence layer — a fully supported configuration, not a
//!   degraded one.
//!
//! Writes always carry the entire collection snapshot; concurrent saves
//! from another device are last-writer-wins at the remote, and the realtime
//! [`Subscription`] delivering full snapshots is the only cross-device
//! reconciliation mechanism.

pub mod coordinator;
pub mod error;
pub mod local;
pub mod remote;
pub mod store;
pub mod subscription;

pub use coordinator::SyncedStore;
pub use error::StoreError;
pub use local::LocalCacheStore;
pub use remote::{RemoteBackend, RemoteEntries, RemoteStore, UserDocument, UsernameRecord};
pub use store::{entry_store, EntryStore};
pub use subscription::Subscription;
