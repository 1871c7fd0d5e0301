//! Local cache store: one JSON document per user under the data directory.
//!
//! This is the offline half of the dual-persistence layer and the sole
//! persistence layer when no remote backend is configured. Keys are
//! namespaced per user identity so switching accounts never leaks or
//! overwrites another account's cached entries. Writes are bounded by a
//! byte quota mirroring the host storage limits the cache lives under.

use crate::error::StoreError;
use keepsake_core::entry::Entry;
use std::fs;
use std::path::{Path, PathBuf};

/// Default write quota, sized like the browser storage the cache stands in
/// for.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

const KEY_PREFIX: &str = "entries_";

#[derive(Debug, Clone)]
pub struct LocalCacheStore {
    dir: PathBuf,
    quota_bytes: u64,
}

impl LocalCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_bytes
    }

    /// Persist the full collection for `user_key`.
    ///
    /// Quota exhaustion is reported distinctly from other write failures so
    /// the caller can offer actionable guidance instead of a generic error.
    pub fn save(&self, user_key: &str, entries: &[Entry]) -> Result<(), StoreError> {
        let payload = serde_json::to_vec(entries)?;
        if payload.len() as u64 > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                needed: payload.len() as u64,
                limit: self.quota_bytes,
            });
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(user_key);
        // Write-then-rename keeps the previous document intact if the
        // process dies mid-write: the cache must always hold a readable
        // last-known-good snapshot.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &payload)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(user = %user_key, bytes = payload.len(), "cached entries locally");
        Ok(())
    }

    /// Read the cached collection for `user_key`; an absent record is an
    /// empty list, not an error.
    pub fn load(&self, user_key: &str) -> Result<Vec<Entry>, StoreError> {
        let path = self.path_for(user_key);
        match fs::read(&path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn path_for(&self, user_key: &str) -> PathBuf {
        self.dir
            .join(format!("{KEY_PREFIX}{}.json", sanitize_key(user_key)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Make a user key safe to use as a file stem. Distinct printable keys stay
/// distinct for the identifier alphabets identity providers emit.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
