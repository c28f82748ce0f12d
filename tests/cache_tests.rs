// ============================================================================
// Query Cache Integration Tests
// ============================================================================
//
// The cache is caller-owned and bounded; these tests drive it against a real
// store and count handle opens to tell cached reads from fetched ones.

use std::num::NonZeroUsize;
use std::sync::Arc;
use userdb::seed::seed_sample;
use userdb::{ConnectionScope, QueryCache, User, UserStore};

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_repeated_query_hits_the_store_once() {
    let store = Arc::new(UserStore::new());
    seed_sample(&store).unwrap();
    let scope = ConnectionScope::new(Arc::clone(&store));
    let cache = QueryCache::new(nz(16));

    let opened_before = store.stats().connections_opened;
    for _ in 0..5 {
        let rows = cache
            .get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))
            .unwrap();
        assert_eq!(rows.len(), 8);
    }

    // one fetch, four cache hits
    assert_eq!(store.stats().connections_opened, opened_before + 1);
}

#[test]
fn test_distinct_queries_are_cached_separately() {
    let store = Arc::new(UserStore::new());
    seed_sample(&store).unwrap();
    let scope = ConnectionScope::new(Arc::clone(&store));
    let cache = QueryCache::new(nz(16));

    let all = cache
        .get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))
        .unwrap();
    let older = cache
        .get_or_fetch("older than 40", || {
            scope.run(|conn| conn.fetch_older_than(40))
        })
        .unwrap();

    assert!(older.len() < all.len());
    assert_eq!(cache.len().unwrap(), 2);
}

#[test]
fn test_cache_serves_stale_rows_until_invalidated() {
    let store = Arc::new(UserStore::new());
    let scope = ConnectionScope::new(Arc::clone(&store));
    let cache = QueryCache::new(nz(16));

    let rows = cache
        .get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))
        .unwrap();
    assert!(rows.is_empty());

    scope
        .run(|conn| conn.insert(User::new("Alice", "alice@example.com", 30)))
        .unwrap();

    // still the cached (empty) result
    let rows = cache
        .get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))
        .unwrap();
    assert!(rows.is_empty());

    cache.invalidate("all users").unwrap();
    let rows = cache
        .get_or_fetch("all users", || scope.run(|conn| conn.fetch_all()))
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_capacity_bound_is_enforced() {
    let store = Arc::new(UserStore::new());
    seed_sample(&store).unwrap();
    let scope = ConnectionScope::new(Arc::clone(&store));
    let cache = QueryCache::new(nz(3));

    for age in 0..10 {
        cache
            .get_or_fetch(&format!("older than {age}"), || {
                scope.run(|conn| conn.fetch_older_than(age))
            })
            .unwrap();
    }

    assert_eq!(cache.len().unwrap(), 3);
    // the oldest entries were evicted, the newest survive
    assert!(cache.get("older than 0").unwrap().is_none());
    assert!(cache.get("older than 9").unwrap().is_some());
}
