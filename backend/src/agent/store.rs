//! Profile Store & Message Log
//!
//! Storage seams for the coach. [`ProfileStore`] persists one
//! [`SessionProfile`] per session; [`MessageLog`] is the append-only chat
//! history. The SQLite implementation lives in `memory.rs`; this module holds
//! the in-process store used by tests and the bounded write-through cache.

use super::types::{ChatMessage, SessionProfile};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Lock a mutex, converting poisoning into a [`StoreError`]
pub(crate) fn lock<'a, T>(
    mutex: &'a Mutex<T>,
    what: &'static str,
) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::LockPoisoned(what))
}

// ============================================================
// STORAGE TRAITS
// ============================================================

pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the session has never been saved
    fn load(&self, session_id: &str) -> Result<Option<SessionProfile>, StoreError>;

    /// Insert or replace the profile for `profile.session_id`
    fn save(&self, profile: &SessionProfile) -> Result<(), StoreError>;
}

pub trait MessageLog: Send + Sync {
    fn append(&self, message: &ChatMessage) -> Result<(), StoreError>;

    /// Messages for a session in insertion order
    fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;
}

impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    fn load(&self, session_id: &str) -> Result<Option<SessionProfile>, StoreError> {
        (**self).load(session_id)
    }

    fn save(&self, profile: &SessionProfile) -> Result<(), StoreError> {
        (**self).save(profile)
    }
}

impl<T: MessageLog + ?Sized> MessageLog for Arc<T> {
    fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        (**self).append(message)
    }

    fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        (**self).history(session_id)
    }
}

// ============================================================
// IN-MEMORY STORE
// ============================================================

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: Mutex<HashMap<String, SessionProfile>>,
    messages: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryStore {
    fn load(&self, session_id: &str) -> Result<Option<SessionProfile>, StoreError> {
        Ok(lock(&self.profiles, "profiles")?.get(session_id).cloned())
    }

    fn save(&self, profile: &SessionProfile) -> Result<(), StoreError> {
        lock(&self.profiles, "profiles")?.insert(profile.session_id.clone(), profile.clone());
        Ok(())
    }
}

impl MessageLog for InMemoryStore {
    fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        lock(&self.messages, "messages")?
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(lock(&self.messages, "messages")?
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================
// CACHED PROFILE STORE
// ============================================================

#[derive(Debug, Default)]
struct CacheState {
    /// Profile plus the tick of its last use
    entries: HashMap<String, (SessionProfile, u64)>,
    tick: u64,
    /// Bumped by every cached save. A miss fill only lands if no save
    /// happened while the inner store was being read.
    saves: u64,
}

impl CacheState {
    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn insert(&mut self, profile: SessionProfile, capacity: usize) {
        let tick = self.touch();
        self.entries.insert(profile.session_id.clone(), (profile, tick));

        while self.entries.len() > capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, used))| *used)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    log::debug!("Evicting cached profile {}", id);
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
    }
}

/// Bounded least-recently-used cache in front of another [`ProfileStore`].
///
/// Writes go to the inner store first and only then to the cache, so a failed
/// save never leaves a cached profile the store does not have. A capacity of
/// zero disables caching.
#[derive(Debug)]
pub struct CachedProfileStore<S> {
    inner: S,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl<S: ProfileStore> CachedProfileStore<S> {
    pub fn new(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of profiles currently cached
    pub fn cached_len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }
}

impl<S: ProfileStore> ProfileStore for CachedProfileStore<S> {
    fn load(&self, session_id: &str) -> Result<Option<SessionProfile>, StoreError> {
        if self.capacity == 0 {
            return self.inner.load(session_id);
        }

        let saves_before = {
            let mut state = lock(&self.state, "profile cache")?;
            let tick = state.touch();
            if let Some((profile, used)) = state.entries.get_mut(session_id) {
                *used = tick;
                return Ok(Some(profile.clone()));
            }
            state.saves
        };

        let loaded = self.inner.load(session_id)?;

        let mut state = lock(&self.state, "profile cache")?;
        let tick = state.touch();
        if let Some((cached, used)) = state.entries.get_mut(session_id) {
            // Filled by a save while we were reading; it is at least as new
            *used = tick;
            return Ok(Some(cached.clone()));
        }
        if let Some(profile) = &loaded {
            if state.saves == saves_before {
                state.insert(profile.clone(), self.capacity);
            } else {
                log::debug!("Skipping cache fill for {}: saved during read", session_id);
            }
        }
        Ok(loaded)
    }

    fn save(&self, profile: &SessionProfile) -> Result<(), StoreError> {
        self.inner.save(profile)?;
        if self.capacity > 0 {
            let mut state = lock(&self.state, "profile cache")?;
            state.saves += 1;
            state.insert(profile.clone(), self.capacity);
        }
        Ok(())
    }
}
