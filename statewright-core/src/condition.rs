//! Interned transition conditions.
//!
//! A [`Condition`] labels an edge of the state graph. Conditions are interned
//! in a [`ConditionRegistry`]: asking a registry for the same name twice yields
//! the same allocation. Equality, hashing and ordering only look at the name,
//! so conditions from different registries still compare equal when their
//! names match.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Name of the condition every registry starts with.
pub const DEFAULT_CONDITION: &str = "DEFAULT";

static GLOBAL_REGISTRY: OnceLock<Arc<ConditionRegistry>> = OnceLock::new();

/// An interned, immutable transition label.
#[derive(Clone)]
pub struct Condition(Arc<str>);

impl Condition {
    /// Interns `name` in the process-wide registry.
    pub fn get_or_create(name: &str) -> Self {
        ConditionRegistry::global().get_or_create(name)
    }

    /// The `DEFAULT` condition from the process-wide registry.
    pub fn default_condition() -> Self {
        Self::get_or_create(DEFAULT_CONDITION)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true if both values point at the same interned allocation.
    pub fn ptr_eq(a: &Condition, b: &Condition) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        Condition::ptr_eq(self, other) || self.0 == other.0
    }
}

impl Eq for Condition {}

impl Hash for Condition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must match `str`'s hash so `Borrow<str>` lookups work.
        self.name().hash(state)
    }
}

impl PartialOrd for Condition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Condition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name().cmp(other.name())
    }
}

impl Borrow<str> for Condition {
    fn borrow(&self) -> &str {
        self.name()
    }
}

impl AsRef<str> for Condition {
    fn as_ref(&self) -> &str {
        self.name()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.name()).finish()
    }
}

/// Append-only table of interned conditions.
///
/// Safe to share between threads. Entries are never evicted.
pub struct ConditionRegistry {
    conditions: DashMap<Arc<str>, Condition>,
}

impl ConditionRegistry {
    /// Creates an isolated registry holding only [`DEFAULT_CONDITION`].
    pub fn new() -> Self {
        let registry = Self {
            conditions: DashMap::new(),
        };
        registry.get_or_create(DEFAULT_CONDITION);
        registry
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> Arc<ConditionRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(ConditionRegistry::new()))
            .clone()
    }

    /// Returns the canonical condition for `name`, interning it if needed.
    pub fn get_or_create(&self, name: &str) -> Condition {
        if let Some(existing) = self.conditions.get(name) {
            return existing.value().clone();
        }

        let key: Arc<str> = Arc::from(name);
        self.conditions
            .entry(key.clone())
            .or_insert_with(|| Condition(key))
            .value()
            .clone()
    }

    /// Looks up a condition without interning it.
    pub fn get(&self, name: &str) -> Option<Condition> {
        self.conditions.get(name).map(|c| c.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conditions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConditionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionRegistry")
            .field("len", &self.len())
            .finish()
    }
}
