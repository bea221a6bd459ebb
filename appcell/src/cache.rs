use std::{
    any::{type_name, Any},
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use crossbeam::channel::{unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use crate::overrides::{OverrideStack, Restore};
use crate::{debug, AppError, ScopeKey};

pub type SharedValue = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum EntryKind {
    State,
    Stored,
    Dependency,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::State => write!(f, "State"),
            EntryKind::Stored => write!(f, "StoredState"),
            EntryKind::Dependency => write!(f, "Dependency"),
        }
    }
}

/// One live value in the cache. Dependency entries hold a `OnceCell<T>` so that
/// the first resolution can run its factory outside of the cache lock.
#[derive(Clone)]
pub struct CacheEntry {
    kind: EntryKind,
    type_name: &'static str,
    value: SharedValue,
}

impl CacheEntry {
    pub fn new<T: Send + Sync + 'static>(kind: EntryKind, value: T) -> Self {
        match kind {
            EntryKind::Dependency => Self::slot(Arc::new(OnceCell::with_value(value))),
            _ => Self { kind, type_name: type_name::<T>(), value: Arc::new(value) },
        }
    }

    pub(crate) fn slot<T: Send + Sync + 'static>(slot: Arc<OnceCell<T>>) -> Self {
        Self { kind: EntryKind::Dependency, type_name: type_name::<T>(), value: slot }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Typed read; `None` on a type mismatch or an unresolved dependency slot.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        match self.kind {
            EntryKind::Dependency => self.value.downcast_ref::<OnceCell<T>>().and_then(|cell| cell.get().cloned()),
            _ => self.value.downcast_ref::<T>().cloned(),
        }
    }

    pub(crate) fn as_slot<T: Send + Sync + 'static>(&self) -> Option<Arc<OnceCell<T>>> {
        match self.kind {
            EntryKind::Dependency => Arc::downcast::<OnceCell<T>>(self.value.clone()).ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.kind, self.type_name)
    }
}

#[derive(Clone, Debug)]
pub enum Change {
    Set(CacheEntry),
    Removed,
}

/// Emitted to every subscriber after a cache mutation.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub key: ScopeKey,
    pub change: Change,
}

impl ChangeEvent {
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        match &self.change {
            Change::Set(entry) => entry.get::<T>(),
            Change::Removed => None,
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self.change, Change::Removed)
    }
}

#[derive(Default)]
pub(crate) struct Slots {
    entries: HashMap<ScopeKey, CacheEntry>,
    overrides: HashMap<ScopeKey, OverrideStack>,
    next_token: u64,
    revisions: HashMap<ScopeKey, u64>,
    next_revision: u64,
    subscribers: Vec<Sender<ChangeEvent>>,
}

impl Slots {
    pub(crate) fn entry(&self, key: &ScopeKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub(crate) fn get<T: Clone + 'static>(&self, key: &ScopeKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        let value = entry.get::<T>();
        if value.is_none() && entry.type_name != type_name::<T>() {
            debug!("{} holds {:?}, read as {} falls back", key, entry, type_name::<T>());
        }
        value
    }

    pub(crate) fn top_override<T: Clone + 'static>(&self, key: &ScopeKey) -> Option<T> {
        self.overrides.get(key).and_then(|stack| stack.top()).and_then(|entry| entry.get::<T>())
    }

    /// The value beneath every active override, i.e. what is left once they are all cancelled.
    pub(crate) fn base<T: Clone + 'static>(&self, key: &ScopeKey) -> Option<T> {
        match self.overrides.get(key) {
            Some(stack) => stack.base().and_then(|entry| entry.get::<T>()),
            None => self.get::<T>(key),
        }
    }

    /// Bumped on every change to the key's slot or to the value beneath its overrides.
    pub(crate) fn revision(&self, key: &ScopeKey) -> u64 {
        self.revisions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &ScopeKey) {
        self.next_revision += 1;
        self.revisions.insert(key.clone(), self.next_revision);
    }

    pub(crate) fn insert(&mut self, key: ScopeKey, entry: CacheEntry) -> Option<CacheEntry> {
        self.touch(&key);
        let previous = self.entries.insert(key.clone(), entry.clone());
        self.emit(key, Change::Set(entry));
        previous
    }

    /// Inserts without notifying; used for dependency slots that hold no value yet.
    pub(crate) fn insert_silent(&mut self, key: ScopeKey, entry: CacheEntry) {
        self.touch(&key);
        self.entries.insert(key, entry);
    }

    pub(crate) fn remove(&mut self, key: &ScopeKey) -> Option<CacheEntry> {
        self.touch(key);
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.emit(key.clone(), Change::Removed);
        }
        removed
    }

    /// Application write. While the key is overridden the slot keeps showing the top
    /// override and the value goes beneath the stack, surfacing once it is cancelled.
    pub(crate) fn write(&mut self, key: ScopeKey, entry: CacheEntry) {
        if let Some(stack) = self.overrides.get_mut(&key) {
            stack.set_base(Some(entry));
            self.touch(&key);
            debug!("{} is overridden, write kept beneath the override", key);
        } else {
            self.insert(key, entry);
        }
    }

    /// Application removal; like `write`, leaves active overrides in place.
    pub(crate) fn erase(&mut self, key: &ScopeKey) -> bool {
        if let Some(stack) = self.overrides.get_mut(key) {
            let had_value = stack.set_base(None).is_some();
            self.touch(key);
            had_value
        } else {
            self.remove(key).is_some()
        }
    }

    pub(crate) fn emit(&mut self, key: ScopeKey, change: Change) {
        if self.subscribers.is_empty() {
            return;
        }
        let event = ChangeEvent { key, change };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn push_override(&mut self, key: &ScopeKey, entry: CacheEntry) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        let previous = self.insert(key.clone(), entry.clone());
        self.overrides.entry(key.clone()).or_default().push(token, entry, previous);
        token
    }

    fn cancel_override(&mut self, key: &ScopeKey, token: u64) -> Result<(), AppError> {
        let invalid = || AppError::InvalidOverrideCancel { key: key.clone(), token };
        let stack = self.overrides.get_mut(key).ok_or_else(invalid)?;
        let restore = stack.cancel(token).ok_or_else(invalid)?;
        if stack.is_empty() {
            self.overrides.remove(key);
        }
        if let Restore::Slot(previous) = restore {
            match previous {
                Some(entry) => {
                    self.insert(key.clone(), entry);
                }
                None => {
                    self.remove(key);
                }
            }
        }
        Ok(())
    }
}

/// Process-wide heterogeneous map from `ScopeKey` to a type-erased value.
/// Slots and override stacks share one mutex. Caller closures passed to `update` run
/// outside it; stored-state encoding and store calls run under it.
#[derive(Default)]
pub struct ScopedCache {
    slots: Mutex<Slots>,
}

impl ScopedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get<T: Clone + 'static>(&self, key: &ScopeKey) -> Option<T> {
        self.lock().get::<T>(key)
    }

    /// Stores `value`. Under an active override the write lands beneath the override stack.
    pub fn set<T: Send + Sync + 'static>(&self, key: &ScopeKey, kind: EntryKind, value: T) {
        self.lock().write(key.clone(), CacheEntry::new(kind, value));
    }

    /// Read-modify-write without lost updates. `f` receives the current value (the one
    /// beneath any override), or `fallback()` when there is none, and returns the value to
    /// store or `None` to leave the slot alone.
    ///
    /// `f` and `fallback` run outside the cache lock, so they may read or write other
    /// cells of the same cache. If the key changes while `f` runs, `f` is called again
    /// with the fresh value; keep it free of side effects other than its result.
    pub fn update<T, D, F>(&self, key: &ScopeKey, kind: EntryKind, fallback: D, mut f: F) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
        D: Fn() -> T,
        F: FnMut(T) -> Option<T>,
    {
        loop {
            let (current, revision) = {
                let slots = self.lock();
                (slots.base::<T>(key), slots.revision(key))
            };
            let next = f(current.unwrap_or_else(&fallback))?;
            let mut slots = self.lock();
            if slots.revision(key) == revision {
                slots.write(key.clone(), CacheEntry::new(kind, next.clone()));
                return Some(next);
            }
            debug!("{} changed during update, retrying", key);
        }
    }

    /// Removes the value. Active overrides stay; the key reads as absent once they are cancelled.
    pub fn remove(&self, key: &ScopeKey) -> bool {
        self.lock().erase(key)
    }

    pub fn contains(&self, key: &ScopeKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<ScopeKey> {
        let mut keys: Vec<ScopeKey> = self.lock().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drops every entry and every override stack.
    pub fn clear(&self) {
        let mut slots = self.lock();
        slots.overrides.clear();
        let keys: Vec<ScopeKey> = slots.entries.keys().cloned().collect();
        for key in keys {
            slots.remove(&key);
        }
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    pub fn push_override(&self, key: &ScopeKey, entry: CacheEntry) -> u64 {
        let token = self.lock().push_override(key, entry);
        debug!("override {} pushed on {}", token, key);
        token
    }

    pub fn cancel_override(&self, key: &ScopeKey, token: u64) -> Result<(), AppError> {
        self.lock().cancel_override(key, token)?;
        debug!("override {} cancelled on {}", token, key);
        Ok(())
    }

    pub fn override_depth(&self, key: &ScopeKey) -> usize {
        self.lock().overrides.get(key).map_or(0, OverrideStack::len)
    }

    /// One line per live entry, sorted by key.
    pub fn describe(&self) -> Vec<String> {
        let slots = self.lock();
        let mut lines: Vec<(ScopeKey, String)> = slots
            .entries
            .iter()
            .map(|(key, entry)| {
                let depth = slots.overrides.get(key).map_or(0, OverrideStack::len);
                let line = if depth > 0 {
                    format!("{:?} ({}) [{} override(s)]", entry, key, depth)
                } else {
                    format!("{:?} ({})", entry, key)
                };
                (key.clone(), line)
            })
            .collect();
        lines.sort_by(|a, b| a.0.cmp(&b.0));
        lines.into_iter().map(|(_, line)| line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn key(id: &'static str) -> ScopeKey {
        ScopeKey::new("cache_tests", id)
    }

    #[test]
    fn set_then_get_from_any_call_site() {
        let cache = ScopedCache::new();
        cache.set(&key("username"), EntryKind::State, String::from("0xL"));
        assert_eq!(cache.get::<String>(&key("username")), Some("0xL".to_string()));
        assert_eq!(cache.get::<String>(&ScopeKey::new("cache_tests", "username")), Some("0xL".to_string()));
        assert!(cache.remove(&key("username")));
        assert_eq!(cache.get::<String>(&key("username")), None);
        assert!(!cache.remove(&key("username")));
    }

    #[test]
    fn type_mismatch_reads_as_absent() {
        let cache = ScopedCache::new();
        cache.set(&key("count"), EntryKind::State, 5u32);
        assert_eq!(cache.get::<i64>(&key("count")), None);
        assert_eq!(cache.get::<u32>(&key("count")), Some(5));
    }

    #[test]
    fn dependency_entries_read_through_their_slot() {
        let cache = ScopedCache::new();
        cache.set(&key("service"), EntryKind::Dependency, Arc::new(42usize));
        assert_eq!(cache.get::<Arc<usize>>(&key("service")).as_deref(), Some(&42));

        cache.lock().insert_silent(key("pending"), CacheEntry::slot(Arc::new(OnceCell::<u8>::new())));
        assert_eq!(cache.get::<u8>(&key("pending")), None);
        assert!(cache.contains(&key("pending")));
    }

    #[test]
    fn update_uses_fallback_then_cached_value() {
        let cache = ScopedCache::new();
        let first = cache.update(&key("n"), EntryKind::State, || 10, |n| Some(n + 1));
        assert_eq!(first, Some(11));
        let second = cache.update(&key("n"), EntryKind::State, || 10, |n| Some(n + 1));
        assert_eq!(second, Some(12));
        let skipped = cache.update(&key("n"), EntryKind::State, || 10, |_: i32| None);
        assert_eq!(skipped, None);
        assert_eq!(cache.get::<i32>(&key("n")), Some(12));
    }

    #[test]
    fn concurrent_updates_are_not_torn() {
        let cache = ScopedCache::new();
        let threads = 8;
        let barrier = Barrier::new(threads);
        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    barrier.wait();
                    for _ in 0..100 {
                        cache.update(&key("counter"), EntryKind::State, || 0u64, |n| Some(n + 1));
                    }
                });
            }
        });
        assert_eq!(cache.get::<u64>(&key("counter")), Some(800));
    }

    #[test]
    fn update_closure_may_use_the_same_cache() {
        let cache = ScopedCache::new();
        cache.set(&key("other"), EntryKind::State, 41i32);
        let total = cache.update(&key("total"), EntryKind::State, || 1i32, |n| {
            cache.get::<i32>(&key("other")).map(|other| n + other)
        });
        assert_eq!(total, Some(42));
    }

    #[test]
    fn update_reruns_when_key_changes_underneath() {
        let cache = ScopedCache::new();
        let mut calls = 0;
        let result = cache.update(&key("n"), EntryKind::State, || 0i32, |n| {
            calls += 1;
            if calls == 1 {
                cache.set(&key("n"), EntryKind::State, 10i32);
            }
            Some(n + 1)
        });
        assert_eq!(result, Some(11));
        assert_eq!(calls, 2);
        assert_eq!(cache.get::<i32>(&key("n")), Some(11));
    }

    #[test]
    fn writes_under_an_override_surface_after_cancel() {
        let cache = ScopedCache::new();
        cache.set(&key("mode"), EntryKind::State, "live");
        let token = cache.push_override(&key("mode"), CacheEntry::new(EntryKind::State, "preview"));
        cache.set(&key("mode"), EntryKind::State, "edited");
        assert_eq!(cache.get::<&str>(&key("mode")), Some("preview"));
        assert_eq!(cache.lock().base::<&str>(&key("mode")), Some("edited"));
        cache.cancel_override(&key("mode"), token).unwrap();
        assert_eq!(cache.get::<&str>(&key("mode")), Some("edited"));
    }

    #[test]
    fn remove_under_an_override_clears_only_the_base() {
        let cache = ScopedCache::new();
        cache.set(&key("mode"), EntryKind::State, 1u8);
        let token = cache.push_override(&key("mode"), CacheEntry::new(EntryKind::State, 2u8));
        assert!(cache.remove(&key("mode")));
        assert_eq!(cache.get::<u8>(&key("mode")), Some(2));
        cache.cancel_override(&key("mode"), token).unwrap();
        assert!(!cache.contains(&key("mode")));
    }

    #[test]
    fn subscribers_see_sets_and_removals() {
        let cache = ScopedCache::new();
        let rx = cache.subscribe();
        cache.set(&key("flag"), EntryKind::State, true);
        cache.remove(&key("flag"));
        let set = rx.try_recv().unwrap();
        assert_eq!(set.key, key("flag"));
        assert_eq!(set.value::<bool>(), Some(true));
        assert!(rx.try_recv().unwrap().is_removal());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let cache = ScopedCache::new();
        drop(cache.subscribe());
        cache.set(&key("flag"), EntryKind::State, true);
        assert!(cache.lock().subscribers.is_empty());
    }

    #[test]
    fn clear_drops_entries_and_overrides() {
        let cache = ScopedCache::new();
        cache.set(&key("a"), EntryKind::State, 1u8);
        let token = cache.push_override(&key("b"), CacheEntry::new(EntryKind::State, 2u8));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.override_depth(&key("b")), 0);
        assert!(matches!(cache.cancel_override(&key("b"), token), Err(AppError::InvalidOverrideCancel { .. })));
    }

    #[test]
    fn describe_lists_kind_type_and_overrides() {
        let cache = ScopedCache::new();
        cache.set(&key("b"), EntryKind::Stored, 1i32);
        cache.set(&key("a"), EntryKind::State, String::new());
        let _token = cache.push_override(&key("b"), CacheEntry::new(EntryKind::Stored, 2i32));
        assert_eq!(
            cache.describe(),
            vec![
                "State<alloc::string::String> (cache_tests.a)".to_string(),
                "StoredState<i32> (cache_tests.b) [1 override(s)]".to_string(),
            ]
        );
    }
}
