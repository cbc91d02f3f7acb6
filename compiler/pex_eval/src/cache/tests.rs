use pretty_assertions::assert_eq;

use super::*;

#[test]
fn fifo_evicts_oldest() {
    let mut cache = BoundedCache::new(2, EvictionPolicy::Fifo);
    cache.insert("a", 1);
    cache.insert("b", 2);
    assert_eq!(cache.get("a"), Some(1));
    cache.insert("c", 3);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn second_chance_keeps_recently_read_entries() {
    let mut cache = BoundedCache::new(2, EvictionPolicy::SecondChance);
    cache.insert("a", 1);
    cache.insert("b", 2);
    assert_eq!(cache.get("a"), Some(1));
    cache.insert("c", 3);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("b"), None);
    assert_eq!(cache.len(), 2);
}

#[test]
fn second_chance_terminates_when_everything_was_read() {
    let mut cache = BoundedCache::new(3, EvictionPolicy::SecondChance);
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        cache.insert(k, v);
        cache.get(k);
    }
    cache.insert("d", 4);
    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get("a"), None);
}

#[test]
fn zero_capacity_disables_caching() {
    let mut cache = BoundedCache::new(0, EvictionPolicy::Fifo);
    cache.insert("a", 1);
    assert!(cache.is_empty());
    assert_eq!(cache.get("a"), None);
}

#[test]
fn reinserting_replaces_in_place() {
    let mut cache = BoundedCache::new(2, EvictionPolicy::Fifo);
    cache.insert("a", 1);
    cache.insert("a", 2);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a"), Some(2));
}

#[test]
fn stats_count_hits_and_misses() {
    let mut cache = BoundedCache::new(4, EvictionPolicy::SecondChance);
    cache.insert(1, "one");
    cache.get(&1);
    cache.get(&2);
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.len, stats.capacity), (1, 1, 1, 4));
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn regex_cache_reuses_and_does_not_cache_errors() {
    let mut caches = Caches::default();
    assert!(caches.regex("a+b", false).is_ok());
    assert!(caches.regex("a+b", false).is_ok());
    assert!(caches.regex("A+B", true).is_ok_and(|re| re.is_match("aab")));
    assert!(caches.regex("(", false).is_err());
    let stats = caches.regex_stats();
    assert_eq!(stats.len, 2);
    assert_eq!(stats.hits, 1);
}

#[test]
fn formula_cache_shares_compiled_formulas() {
    let first = cached_formula(",'1,'2,+", FormulaDialect::Rpn);
    let second = cached_formula(",'1,'2,+", FormulaDialect::Rpn);
    assert!(Arc::ptr_eq(&first, &second));
    let other_dialect = cached_formula(",'1,'2,+", FormulaDialect::RpnWithPercents);
    assert!(!Arc::ptr_eq(&first, &other_dialect));
}

#[test]
fn isolated_caches_respect_config() {
    let config = CacheConfig {
        regex_capacity: 1,
        formula_capacity: 1,
        policy: EvictionPolicy::Fifo,
    };
    let mut caches = Caches::new(&config);
    assert!(caches.regex("a", false).is_ok());
    assert!(caches.regex("b", false).is_ok());
    assert_eq!(caches.regex_stats().len, 1);

    caches.store_formula(Arc::new(CompiledFormula::new(",x", FormulaDialect::Rpn)));
    caches.store_formula(Arc::new(CompiledFormula::new(",y", FormulaDialect::Rpn)));
    assert!(caches.lookup_formula(",x", FormulaDialect::Rpn).is_none());
    assert!(caches.lookup_formula(",y", FormulaDialect::Rpn).is_some());
    caches.clear();
    assert_eq!(caches.formula_stats().len, 0);
}

#[test]
fn default_config() {
    let config = CacheConfig::default();
    assert_eq!(config.regex_capacity, 256);
    assert_eq!(config.formula_capacity, 512);
    assert_eq!(config.policy, EvictionPolicy::SecondChance);
}
