//! Bounded caches for compiled regexes and formulas.
//!
//! Each thread owns one [`Caches`] instance, reachable through
//! [`with_thread_caches`]. Callers that want an isolated cache (tests,
//! embedders with their own threading model) can build a `Caches` directly.
//! Evaluation never holds a cache borrow while it compiles or evaluates, so
//! compiling a formula may itself look up regexes and nested formulas.

use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashMap;

use crate::rpn::{CompiledFormula, FormulaDialect};

/// Environment variable overriding the regex cache capacity.
pub const REGEX_CACHE_SIZE_VAR: &str = "PEX_REGEX_CACHE_SIZE";
/// Environment variable overriding the formula cache capacity.
pub const FORMULA_CACHE_SIZE_VAR: &str = "PEX_FORMULA_CACHE_SIZE";

/// What to drop when a cache is full.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Oldest entry first.
    Fifo,
    /// Oldest entry first, unless it was read since it was last considered;
    /// such an entry is moved to the back once.
    SecondChance,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    referenced: bool,
}

/// Fixed-capacity map with FIFO or second-chance eviction.
///
/// A capacity of zero disables caching: inserts are dropped.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    policy: EvictionPolicy,
    slots: FxHashMap<K, Slot<V>>,
    order: VecDeque<K>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        BoundedCache {
            capacity,
            policy,
            slots: FxHashMap::default(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.referenced = true;
            self.hits += 1;
            Some(slot.value.clone())
        } else {
            self.misses += 1;
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.value = value;
            return;
        }
        while self.slots.len() >= self.capacity {
            self.evict_one();
        }
        self.order.push_back(key.clone());
        self.slots.insert(
            key,
            Slot {
                value,
                referenced: false,
            },
        );
    }

    fn evict_one(&mut self) {
        while let Some(key) = self.order.pop_front() {
            let second_chance = self.policy == EvictionPolicy::SecondChance
                && self.slots.get_mut(&key).is_some_and(|slot| {
                    std::mem::replace(&mut slot.referenced, false)
                });
            if second_chance {
                self.order.push_back(key);
                continue;
            }
            if self.slots.remove(&key).is_some() {
                self.evictions += 1;
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.slots.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

/// Capacities of the per-thread caches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub regex_capacity: usize,
    pub formula_capacity: usize,
    pub policy: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            regex_capacity: 256,
            formula_capacity: 512,
            policy: EvictionPolicy::SecondChance,
        }
    }
}

impl CacheConfig {
    /// Defaults, overridden by `PEX_REGEX_CACHE_SIZE` and
    /// `PEX_FORMULA_CACHE_SIZE` when they hold a valid size.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        CacheConfig {
            regex_capacity: env_size(REGEX_CACHE_SIZE_VAR).unwrap_or(defaults.regex_capacity),
            formula_capacity: env_size(FORMULA_CACHE_SIZE_VAR).unwrap_or(defaults.formula_capacity),
            policy: defaults.policy,
        }
    }
}

fn env_size(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(var, value = %raw, "ignoring invalid cache size");
            None
        }
    }
}

type RegexKey = (Box<str>, bool);
type FormulaKey = (FormulaDialect, Box<str>);

/// The regex and formula caches of one evaluator.
#[derive(Debug)]
pub struct Caches {
    regexes: BoundedCache<RegexKey, Regex>,
    formulas: BoundedCache<FormulaKey, Arc<CompiledFormula>>,
}

impl Default for Caches {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl Caches {
    pub fn new(config: &CacheConfig) -> Self {
        Caches {
            regexes: BoundedCache::new(config.regex_capacity, config.policy),
            formulas: BoundedCache::new(config.formula_capacity, config.policy),
        }
    }

    /// Compiled `pattern`, from cache when possible. Failures are not cached.
    pub fn regex(&mut self, pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
        let key: RegexKey = (pattern.into(), case_insensitive);
        if let Some(re) = self.regexes.get(&key) {
            return Ok(re);
        }
        let re = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        self.regexes.insert(key, re.clone());
        Ok(re)
    }

    pub fn lookup_formula(&mut self, expr: &str, dialect: FormulaDialect) -> Option<Arc<CompiledFormula>> {
        self.formulas.get(&(dialect, Box::from(expr)))
    }

    pub fn store_formula(&mut self, formula: Arc<CompiledFormula>) {
        let key = (formula.dialect(), Box::from(formula.source()));
        self.formulas.insert(key, formula);
    }

    pub fn clear(&mut self) {
        self.regexes.clear();
        self.formulas.clear();
    }

    pub fn regex_stats(&self) -> CacheStats {
        self.regexes.stats()
    }

    pub fn formula_stats(&self) -> CacheStats {
        self.formulas.stats()
    }
}

thread_local! {
    static THREAD_CACHES: RefCell<Caches> = RefCell::new(Caches::new(&CacheConfig::from_env()));
}

/// Run `f` with this thread's caches.
///
/// `f` must not evaluate expressions or compile formulas: the caches are
/// borrowed for its whole duration.
pub fn with_thread_caches<R>(f: impl FnOnce(&mut Caches) -> R) -> R {
    THREAD_CACHES.with(|caches| f(&mut caches.borrow_mut()))
}

/// Compile `pattern` through this thread's regex cache.
pub fn cached_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    with_thread_caches(|caches| caches.regex(pattern, case_insensitive))
}

/// Compile `expr` through this thread's formula cache. Compilation runs
/// outside the cache borrow.
pub fn cached_formula(expr: &str, dialect: FormulaDialect) -> Arc<CompiledFormula> {
    if let Some(formula) = with_thread_caches(|caches| caches.lookup_formula(expr, dialect)) {
        return formula;
    }
    let formula = Arc::new(CompiledFormula::new(expr, dialect));
    with_thread_caches(|caches| caches.store_formula(Arc::clone(&formula)));
    formula
}

#[cfg(test)]
mod tests;
