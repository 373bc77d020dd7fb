//! # Generated Cache Context
//!
//! Memoizes [`PartMesher`](crate::PartMesher) output across generation
//! requests. Entries are keyed by part id and validated by a content hash
//! of everything the mesher reads for that part, so a stale entry is never
//! served even though dirty flags are not consulted.
//!
//! The context is the only state shared between generation workers; it is
//! guarded by a mutex and handed around as `Arc<GeneratedCacheContext>`.
//!
//! ## Features
//!
//! - **Content-based validation**: hash of the part's raw snapshot attributes
//! - **LRU eviction**: least recently used entry goes first when full
//! - **Statistics**: hit/miss/eviction counters for tuning

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use config::constants::PART_CACHE_CAPACITY;
use skeleton_snapshot::{Part, SkeletonGraph, Snapshot};

use crate::part_mesher::{linked_profile_parts, PartMesh};

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries currently stored
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate between 0.0 and 1.0, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    content_hash: u64,
    /// `None` records a part that produced no geometry
    mesh: Option<PartMesh>,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    clock: u64,
    stats: CacheStats,
}

impl CacheState {
    fn evict_lru(&mut self) {
        let lru = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = lru {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

/// Part mesh memoization shared by generation workers.
#[derive(Debug)]
pub struct GeneratedCacheContext {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl GeneratedCacheContext {
    /// Creates a context holding at most `capacity` part meshes.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: capacity.max(1),
        }
    }

    // A worker that panicked while holding the lock leaves plain data
    // behind; every field stays consistent between statements.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached mesher output for `part_id`, if its content hash still matches.
    ///
    /// The outer `Option` is the cache hit, the inner one the mesher result.
    pub fn get(&self, part_id: &str, content_hash: u64) -> Option<Option<PartMesh>> {
        let mut state = self.lock();
        state.clock += 1;
        let clock = state.clock;
        let hit = match state.entries.get_mut(part_id) {
            Some(entry) if entry.content_hash == content_hash => {
                entry.last_access = clock;
                Some(entry.mesh.clone())
            }
            _ => None,
        };
        if hit.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        hit
    }

    /// Stores mesher output, replacing any older entry for the part.
    pub fn insert(&self, part_id: &str, content_hash: u64, mesh: Option<PartMesh>) {
        let mut state = self.lock();
        if !state.entries.contains_key(part_id) {
            while state.entries.len() >= self.capacity {
                state.evict_lru();
            }
        }
        state.clock += 1;
        let last_access = state.clock;
        state.entries.insert(
            part_id.to_string(),
            CacheEntry {
                content_hash,
                mesh,
                last_access,
            },
        );
    }

    /// Drops entries of parts for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) {
        self.lock().entries.retain(|part_id, _| keep(part_id));
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Default for GeneratedCacheContext {
    fn default() -> Self {
        Self::new(PART_CACHE_CAPACITY)
    }
}

/// Content hash of everything [`PartMesher`](crate::PartMesher) reads for
/// `part`: the canvas origin, the part's raw attributes, its nodes and edges,
/// and the parts its cut faces link to.
pub fn part_content_hash(
    snapshot: &Snapshot,
    graph: &SkeletonGraph,
    part: &Part,
    segments: usize,
) -> u64 {
    let mut hasher = DefaultHasher::new();
    segments.hash(&mut hasher);
    snapshot.canvas.hash(&mut hasher);
    hash_part(snapshot, part, &mut hasher);
    for linked in linked_profile_parts(graph, part) {
        linked.hash(&mut hasher);
        if let Some(linked_part) = graph.parts.get(linked) {
            hash_part(snapshot, linked_part, &mut hasher);
        }
    }
    hasher.finish()
}

fn hash_part(snapshot: &Snapshot, part: &Part, hasher: &mut DefaultHasher) {
    snapshot.parts.get(&part.id).hash(hasher);
    for node_id in &part.node_ids {
        node_id.hash(hasher);
        snapshot.nodes.get(node_id).hash(hasher);
    }
    for edge_id in &part.edge_ids {
        edge_id.hash(hasher);
        snapshot.edges.get(edge_id).hash(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use skeleton_snapshot::SnapshotBuilder;

    fn part_mesh() -> PartMesh {
        let mut mesh = PartMesh::default();
        let a = mesh.add_vertex(DVec3::ZERO, "n0");
        let b = mesh.add_vertex(DVec3::X, "n1");
        let c = mesh.add_vertex(DVec3::Y, "n1");
        mesh.add_triangle(a, b, c);
        mesh
    }

    #[test]
    fn test_cache_put_get() {
        let cache = GeneratedCacheContext::new(4);
        cache.insert("p", 7, Some(part_mesh()));
        let hit = cache.get("p", 7).unwrap().unwrap();
        assert_eq!(hit.mesh.vertex_count(), 3);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_stale_hash_misses() {
        let cache = GeneratedCacheContext::new(4);
        cache.insert("p", 7, Some(part_mesh()));
        assert!(cache.get("p", 8).is_none());
        assert!(cache.get("q", 7).is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_degenerate_result_is_cached() {
        let cache = GeneratedCacheContext::new(4);
        cache.insert("p", 1, None);
        assert_eq!(cache.get("p", 1), Some(None));
    }

    #[test]
    fn test_cache_eviction_drops_least_recent() {
        let cache = GeneratedCacheContext::new(2);
        cache.insert("a", 1, None);
        cache.insert("b", 1, None);
        assert!(cache.get("a", 1).is_some());
        cache.insert("c", 1, None);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b", 1).is_none());
        assert!(cache.get("a", 1).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_retain_and_clear() {
        let cache = GeneratedCacheContext::new(4);
        cache.insert("a", 1, None);
        cache.insert("b", 1, None);
        cache.retain(|id| id == "a");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let cache = GeneratedCacheContext::new(4);
        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.insert("p", 1, None);
        cache.get("p", 1);
        cache.get("p", 2);
        assert!((cache.stats().hit_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_content_hash_tracks_part_attributes() {
        let base = SnapshotBuilder::new()
            .tube_part("a", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
            .tube_part("b", [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], 0.1);
        let snapshot = base.clone().build();
        let moved = base.node_attribute("a-n1", "x", "2").build();

        let hash = |snapshot: &Snapshot, part: &str| {
            let graph = snapshot.decode().unwrap();
            part_content_hash(snapshot, &graph, &graph.parts[part], 8)
        };
        assert_eq!(hash(&snapshot, "a"), hash(&snapshot.clone(), "a"));
        assert_ne!(hash(&snapshot, "a"), hash(&moved, "a"));
        assert_eq!(hash(&snapshot, "b"), hash(&moved, "b"));
    }

    #[test]
    fn test_content_hash_tracks_segments() {
        let snapshot = SnapshotBuilder::new()
            .tube_part("a", [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 0.1)
            .build();
        let graph = snapshot.decode().unwrap();
        let part = &graph.parts["a"];
        assert_ne!(
            part_content_hash(&snapshot, &graph, part, 8),
            part_content_hash(&snapshot, &graph, part, 12)
        );
    }
}
