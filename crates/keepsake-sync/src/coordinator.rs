//! The sync coordinator: one save/load contract over remote plus local.
//!
//! Routing rules, in full:
//!
//! - `load` reads the remote collection and mirrors the result (empty
//!   included) into the local cache. Any remote failure degrades silently
//!   to the cache: the user must still see their last-known entries.
//! - `save` writes the whole collection remotely, then mirrors the same
//!   write into the cache (write-through, not write-back) so the entries
//!   are available offline after the next reload. A remote failure is
//!   surfaced — silent save failure risks data loss — and nothing is
//!   mirrored, keeping the cache on the last acknowledged state.
//!
//! Every save transmits the full snapshot taken at call time; a save racing
//! another device's save is last-writer-wins at the remote. That is an
//! accepted, named limitation of this design, not a bug to paper over: the
//! realtime subscription delivering full snapshots is the mechanism by
//! which a device learns it lost the race.

use crate::error::StoreError;
use crate::local::LocalCacheStore;
use crate::remote::{RemoteEntries, UserDocument};
use crate::store::EntryStore;
use crate::subscription::Subscription;
use async_trait::async_trait;
use chrono::Utc;
use keepsake_core::entry::Entry;

pub struct SyncedStore<R: RemoteEntries> {
    remote: R,
    local: LocalCacheStore,
}

impl<R: RemoteEntries> SyncedStore<R> {
    pub fn new(remote: R, local: LocalCacheStore) -> Self {
        Self { remote, local }
    }

    /// Mirror a remote result into the cache. Quota exhaustion here is
    /// surfaced (the offline copy is part of the contract); lesser mirror
    /// failures degrade to a warning.
    fn mirror(&self, user_key: &str, entries: &[Entry]) -> Result<(), StoreError> {
        match self.local.save(user_key, entries) {
            Ok(()) => Ok(()),
            Err(err @ StoreError::QuotaExceeded { .. }) => Err(err),
            Err(err) => {
                tracing::warn!(user = %user_key, error = %err, "failed to mirror entries locally");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<R: RemoteEntries> EntryStore for SyncedStore<R> {
    async fn load(&self, user_key: &str) -> Result<Vec<Entry>, StoreError> {
        match self.remote.read(user_key).await {
            Ok(document) => {
                let entries = document.map(|d| d.entries).unwrap_or_default();
                if let Err(err) = self.mirror(user_key, &entries) {
                    tracing::warn!(user = %user_key, error = %err, "load succeeded but local mirror hit quota");
                }
                Ok(entries)
            }
            Err(err) if err.is_remote_failure() => {
                tracing::warn!(user = %user_key, error = %err, "remote load failed, falling back to local cache");
                self.local.load(user_key)
            }
            Err(err) => Err(err),
        }
    }

    async fn save(
        &self,
        user_key: &str,
        entries: &[Entry],
        display_name: Option<&str>,
    ) -> Result<(), StoreError> {
        let document = UserDocument {
            entries: entries.to_vec(),
            last_updated: Utc::now().to_rfc3339(),
            display_name: display_name.map(str::to_string),
        };
        self.remote.write(user_key, &document).await?;
        self.mirror(user_key, entries)
    }

    fn subscribe(&self, user_key: &str) -> Subscription {
        self.remote.subscribe(user_key)
    }
}
