//! # Content Store
//!
//! Content-addressed byte store shared by the stages that produce binary
//! artifacts (texture images). The pipeline owns it and hands it to stages
//! as `Arc<ContentStore>`; its lifetime is the session's, not the process's.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Identifier derived from the stored bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(u64);

impl ContentId {
    /// Identifier the given bytes are stored under.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Thread-safe content-addressed store.
#[derive(Debug, Default)]
pub struct ContentStore {
    entries: Mutex<HashMap<ContentId, Arc<[u8]>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContentId, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `bytes`, returning their id. Storing the same bytes twice
    /// keeps one copy.
    pub fn insert(&self, bytes: Vec<u8>) -> ContentId {
        let id = ContentId::of(&bytes);
        self.lock().entry(id).or_insert_with(|| Arc::from(bytes));
        id
    }

    pub fn get(&self, id: ContentId) -> Option<Arc<[u8]>> {
        self.lock().get(&id).cloned()
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn remove(&self, id: ContentId) -> Option<Arc<[u8]>> {
        self.lock().remove(&id)
    }

    /// Drops everything not listed in `live`.
    pub fn retain(&self, live: &[ContentId]) {
        self.lock().retain(|id, _| live.contains(id));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
