//! The single store contract and the factory that picks an implementation.
//!
//! Call sites never branch on whether a remote backend is configured. The
//! factory resolves that once, from configuration, and returns one
//! polymorphic [`EntryStore`]: remote-backed with a local mirror, or
//! local-only.

use crate::coordinator::SyncedStore;
use crate::error::StoreError;
use crate::local::LocalCacheStore;
use crate::remote::RemoteBackend;
use crate::subscription::Subscription;
use async_trait::async_trait;
use keepsake_core::entry::Entry;
use std::sync::Arc;

/// One load/save/subscribe contract, regardless of backend availability.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// The full collection for the user. Never fails on remote trouble:
    /// degradation to the last cached state is silent by contract.
    async fn load(&self, user_key: &str) -> Result<Vec<Entry>, StoreError>;

    /// Persist the full collection snapshot. Remote failures surface as a
    /// non-blocking warning condition; quota exhaustion surfaces as a
    /// user-actionable one.
    async fn save(
        &self,
        user_key: &str,
        entries: &[Entry],
        display_name: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Realtime feed of full-collection snapshots.
    fn subscribe(&self, user_key: &str) -> Subscription;
}

/// Local-only mode: the cache is the sole persistence layer. A fully
/// supported configuration, not a degraded one.
#[async_trait]
impl EntryStore for LocalCacheStore {
    async fn load(&self, user_key: &str) -> Result<Vec<Entry>, StoreError> {
        LocalCacheStore::load(self, user_key)
    }

    async fn save(
        &self,
        user_key: &str,
        entries: &[Entry],
        _display_name: Option<&str>,
    ) -> Result<(), StoreError> {
        LocalCacheStore::save(self, user_key, entries)
    }

    /// With no remote change source the feed emits current state once and
    /// ends; cancellation remains a no-op-safe operation.
    fn subscribe(&self, user_key: &str) -> Subscription {
        Subscription::immediate(LocalCacheStore::load(self, user_key).unwrap_or_default())
    }
}

/// Build the store for this process from configuration.
pub fn entry_store(config: &keepsake_config::config::AppConfig) -> Arc<dyn EntryStore> {
    let local = LocalCacheStore::new(&config.local.data_dir).with_quota(config.local.quota_bytes);
    match RemoteBackend::from_config(config.remote.as_ref()) {
        RemoteBackend::Configured(remote) => Arc::new(SyncedStore::new(remote, local)),
        RemoteBackend::Unconfigured => Arc::new(local),
    }
}
