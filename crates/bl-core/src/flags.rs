use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::value::FlagValue;

/// Flag name -> value, iterated in insertion order.
pub type FlagMap = IndexMap<String, FlagValue>;

/// Flag references starting with this prefix address the conversation store.
pub const CONVERSATION_PREFIX: &str = "conv:";

/// Key/value capability the runner reads and mutates.
///
/// The game store is supplied by the host and may be shared with code outside
/// the runner, so every method takes `&self`; implementations provide their own
/// interior mutability. `increment` and `decrement` have default bodies built
/// on `get`/`set`.
pub trait FlagStore: Send + Sync {
    fn get(&self, key: &str) -> Option<FlagValue>;
    fn set(&self, key: &str, value: FlagValue);
    fn delete(&self, key: &str) -> bool;
    fn clear(&self);
    fn read_all(&self) -> FlagMap;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.read_all().keys().cloned().collect()
    }

    /// Absent or non-numeric values count as 0. Results saturate at
    /// `f64::MAX` so the stored number stays JSON-representable.
    fn increment(&self, key: &str, amount: f64) -> f64 {
        let current = self
            .get(key)
            .and_then(|value| value.as_number())
            .unwrap_or(0.0);
        let next = finite_counter(current + amount);
        self.set(key, FlagValue::Number(next));
        next
    }

    /// Same as `increment` in reverse, but the result never drops below 0.
    fn decrement(&self, key: &str, amount: f64) -> f64 {
        let current = self
            .get(key)
            .and_then(|value| value.as_number())
            .unwrap_or(0.0);
        let next = finite_counter(current - amount).max(0.0);
        self.set(key, FlagValue::Number(next));
        next
    }
}

/// JSON has no infinities or NaN; clamp counters into the finite range.
fn finite_counter(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-f64::MAX, f64::MAX)
    }
}

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    entries: Mutex<FlagMap>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(entries: FlagMap) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FlagValue>,
    {
        Self::from_map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Swaps the whole content for `entries`, dropping anything not in it.
    pub fn replace_all(&self, entries: FlagMap) {
        *self.lock() = entries;
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, FlagMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Option<FlagValue> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: FlagValue) {
        self.lock().insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) -> bool {
        self.lock().shift_remove(key).is_some()
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn read_all(&self) -> FlagMap {
        self.lock().clone()
    }

    fn has(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn increment(&self, key: &str, amount: f64) -> f64 {
        let mut entries = self.lock();
        let current = entries
            .get(key)
            .and_then(FlagValue::as_number)
            .unwrap_or(0.0);
        let next = finite_counter(current + amount);
        entries.insert(key.to_string(), FlagValue::Number(next));
        next
    }

    fn decrement(&self, key: &str, amount: f64) -> f64 {
        let mut entries = self.lock();
        let current = entries
            .get(key)
            .and_then(FlagValue::as_number)
            .unwrap_or(0.0);
        let next = finite_counter(current - amount).max(0.0);
        entries.insert(key.to_string(), FlagValue::Number(next));
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagScope {
    Game,
    Conversation,
}

impl FlagScope {
    /// Splits a flag reference into its scope and bare key.
    pub fn parse(flag_ref: &str) -> (FlagScope, &str) {
        match flag_ref.strip_prefix(CONVERSATION_PREFIX) {
            Some(key) => (FlagScope::Conversation, key),
            None => (FlagScope::Game, flag_ref),
        }
    }
}

/// The two stores a flag reference can resolve against.
#[derive(Clone, Copy)]
pub struct FlagScopes<'a> {
    pub game: &'a dyn FlagStore,
    pub conversation: &'a dyn FlagStore,
}

impl<'a> FlagScopes<'a> {
    pub fn new(game: &'a dyn FlagStore, conversation: &'a dyn FlagStore) -> Self {
        Self { game, conversation }
    }

    pub fn resolve<'r>(&self, flag_ref: &'r str) -> (&'a dyn FlagStore, &'r str) {
        match FlagScope::parse(flag_ref) {
            (FlagScope::Conversation, key) => (self.conversation, key),
            (FlagScope::Game, key) => (self.game, key),
        }
    }

    pub fn get(&self, flag_ref: &str) -> Option<FlagValue> {
        let (store, key) = self.resolve(flag_ref);
        store.get(key)
    }
}
