//! Standard collection type aliases for tessera.
//!
//! Use these instead of direct HashMap/HashSet so hashing stays
//! consistent across the codebase and can be swapped in one place.

use rustc_hash::FxBuildHasher;

/// Standard HashMap with FxHash (fast, non-cryptographic).
///
/// FxHash is optimized for the small integer and string keys that
/// dominate catalog and index lookups.
pub type TesseraMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Standard HashSet with FxHash.
pub type TesseraSet<T> = hashbrown::HashSet<T, FxBuildHasher>;

/// Concurrent HashMap for multi-threaded access.
///
/// Uses fine-grained locking for concurrent throughput. Prefer this
/// over `Arc<Mutex<HashMap>>` for shared mutable state.
pub type TesseraConcurrentMap<K, V> = dashmap::DashMap<K, V, FxBuildHasher>;

/// Create a new empty [`TesseraMap`].
#[inline]
#[must_use]
pub fn tessera_map<K, V>() -> TesseraMap<K, V> {
    TesseraMap::with_hasher(FxBuildHasher)
}

/// Create a new empty [`TesseraSet`].
#[inline]
#[must_use]
pub fn tessera_set<T>() -> TesseraSet<T> {
    TesseraSet::with_hasher(FxBuildHasher)
}

/// Create a new empty [`TesseraConcurrentMap`].
#[inline]
#[must_use]
pub fn tessera_concurrent_map<K, V>() -> TesseraConcurrentMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    TesseraConcurrentMap::with_hasher(FxBuildHasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_basic() {
        let mut map: TesseraMap<&str, i32> = tessera_map();
        map.insert("a", 1);
        assert_eq!(map.get("a"), Some(&1));
    }

    #[test]
    fn test_set_basic() {
        let mut set: TesseraSet<i32> = tessera_set();
        set.insert(3);
        assert!(set.contains(&3));
    }
}
