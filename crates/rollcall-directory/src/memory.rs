//! In-memory token directory.
//!
//! Entries live in a map guarded by a synchronous lock that is never held
//! across an await point. Fault and latency injection make it usable as a
//! stand-in for a remote directory in tests and demos.

use crate::error::{DirectoryError, DirectoryResult};
use crate::TokenDirectory;
use rollcall_core::{DirectoryEntry, Token};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, warn};

/// Directory backed by a `HashMap`.
///
/// Share it behind an `Arc` to mutate entries while a kiosk session is
/// running; lookups always observe the latest contents.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    entries: RwLock<HashMap<Token, DirectoryEntry>>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    lookups: AtomicU64,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `entries`.
    ///
    /// Later entries replace earlier ones with the same token.
    pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let directory = Self::new();
        for entry in entries {
            directory.insert(entry);
        }
        directory
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Token, DirectoryEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Token, DirectoryEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace an entry, returning the previous one.
    pub fn insert(&self, entry: DirectoryEntry) -> Option<DirectoryEntry> {
        self.write().insert(entry.token.clone(), entry)
    }

    /// Mark the credential for `token` as revoked.
    ///
    /// Returns `false` if the directory has no such token.
    pub fn revoke(&self, token: &Token) -> bool {
        let mut entries = self.write();
        match entries.remove(token) {
            Some(entry) => {
                entries.insert(token.clone(), entry.revoked());
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `token`.
    pub fn remove(&self, token: &Token) -> Option<DirectoryEntry> {
        self.write().remove(token)
    }

    /// Get a copy of the entry for `token` without counting a lookup.
    pub fn get(&self, token: &Token) -> Option<DirectoryEntry> {
        self.read().get(token).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Simulate an unreachable backend: lookups fail with
    /// [`DirectoryError::Unavailable`] while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every lookup by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of lookups served (or attempted) so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl TokenDirectory for InMemoryDirectory {
    async fn lookup(&self, token: &Token) -> DirectoryResult<Option<DirectoryEntry>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            warn!(token = %token, "Directory lookup failed: backend unavailable");
            return Err(DirectoryError::unavailable("in-memory directory offline"));
        }

        let entry = self.get(token);
        debug!(token = %token, found = entry.is_some(), "Directory lookup");
        Ok(entry)
    }
}
