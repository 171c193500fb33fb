use super::{Cursor, DEFAULT_CURSOR_TTL};
use crate::error::{PageError, PageResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Named cursor persistence.
///
/// Implementations must be safe to share across requests. Writes to the same
/// name are last-write-wins; `load` reports expired cursors as absent.
pub trait CursorStore: Send + Sync {
    /// Store `cursor` under `name`, replacing any previous cursor.
    fn save(&self, name: &str, cursor: &Cursor) -> PageResult<()>;

    /// Fetch the cursor stored under `name`, or `None` if absent or expired.
    fn load(&self, name: &str) -> PageResult<Option<Cursor>>;
}

impl<S: CursorStore + ?Sized> CursorStore for Arc<S> {
    fn save(&self, name: &str, cursor: &Cursor) -> PageResult<()> {
        (**self).save(name, cursor)
    }

    fn load(&self, name: &str) -> PageResult<Option<Cursor>> {
        (**self).load(name)
    }
}

impl<S: CursorStore + ?Sized> CursorStore for &S {
    fn save(&self, name: &str, cursor: &Cursor) -> PageResult<()> {
        (**self).save(name, cursor)
    }

    fn load(&self, name: &str) -> PageResult<Option<Cursor>> {
        (**self).load(name)
    }
}

/// In-process cursor store.
///
/// Expiry is checked on read; stale entries stay in the map until they are
/// overwritten or [`MemoryCursorStore::purge_expired`] is called.
#[derive(Debug)]
pub struct MemoryCursorStore {
    entries: RwLock<HashMap<String, Cursor>>,
    ttl: Duration,
}

impl Default for MemoryCursorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCursorStore {
    /// Create an empty store using [`DEFAULT_CURSOR_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CURSOR_TTL)
    }

    /// Create an empty store with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// The TTL enforced on read.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> PageResult<usize> {
        let now = Utc::now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PageError::Store("cursor store lock poisoned".to_string()))?;
        let before = entries.len();
        entries.retain(|_, c| !c.expired_at(now, self.ttl));
        Ok(before - entries.len())
    }
}

impl CursorStore for MemoryCursorStore {
    fn save(&self, name: &str, cursor: &Cursor) -> PageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PageError::Store("cursor store lock poisoned".to_string()))?;
        entries.insert(name.to_string(), cursor.clone());

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "seekpage.cursor", name, "cursor saved");

        Ok(())
    }

    fn load(&self, name: &str) -> PageResult<Option<Cursor>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PageError::Store("cursor store lock poisoned".to_string()))?;
        let Some(cursor) = entries.get(name) else {
            return Ok(None);
        };
        if cursor.expired_at(Utc::now(), self.ttl) {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "seekpage.cursor", name, "cursor expired");
            return Ok(None);
        }
        Ok(Some(cursor.clone()))
    }
}
