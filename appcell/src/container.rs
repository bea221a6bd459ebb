use std::sync::Arc;
use crossbeam::channel::Receiver;
use once_cell::sync::Lazy;
use crate::cache::{CacheEntry, ChangeEvent, EntryKind};
use crate::settings::{Settings, StoreBackend};
use crate::slice::{Constant, Lens, Slice};
use crate::store::{MemoryStore, PersistentStore, RedbStore};
use crate::{
    info, logger, AppError, Dependency, DependencyDef, OverrideToken, Persist, ScopedCache, State, StateDef, StoredDef,
    StoredState,
};

static SHARED: Lazy<Container> = Lazy::new(Container::new);

/// Owns one `ScopedCache` and the store persisted state writes through to.
/// Clones are handles onto the same cache.
#[derive(Clone)]
pub struct Container {
    cache: Arc<ScopedCache>,
    store: Arc<dyn PersistentStore>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Empty container over an in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: impl PersistentStore + 'static) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    pub fn with_shared_store(store: Arc<dyn PersistentStore>) -> Self {
        Self { cache: Arc::new(ScopedCache::new()), store }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        logger::set_enabled(settings.logging.enabled);
        match settings.store.backend {
            StoreBackend::Memory => Ok(Self::new()),
            StoreBackend::Redb => {
                let path = settings.store.path.as_deref().ok_or_else(|| {
                    AppError::Custom("store.path is required for the redb backend".to_string())
                })?;
                info!("Persisting state to {}", path);
                Ok(Self::with_store(RedbStore::open(path)?))
            }
        }
    }

    /// Process-wide instance over an in-memory store, created on first use.
    pub fn shared() -> &'static Container {
        &SHARED
    }

    pub fn cache(&self) -> &Arc<ScopedCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    pub fn state<T: Clone + Send + Sync + 'static>(&self, def: &StateDef<T>) -> State<T> {
        State::new(self.cache.clone(), def.key(), def.initial())
    }

    pub fn stored_state<T: Persist>(&self, def: &StoredDef<T>) -> StoredState<T> {
        StoredState::new(self.cache.clone(), self.store.clone(), def.key(), def.factory())
    }

    pub fn dependency<T: Clone + Send + Sync + 'static>(&self, def: &DependencyDef<T>) -> Dependency<T> {
        Dependency::new(self.clone(), def.key(), def.factory())
    }

    /// Resolves a dependency to its shared instance.
    pub fn resolve<T: Clone + Send + Sync + 'static>(&self, def: &DependencyDef<T>) -> T {
        self.dependency(def).value()
    }

    pub fn override_dependency<T: Clone + Send + Sync + 'static>(&self, def: &DependencyDef<T>, value: T) -> OverrideToken {
        OverrideToken::push(self.cache.clone(), def.key(), CacheEntry::new(EntryKind::Dependency, value))
    }

    pub fn override_state<T: Clone + Send + Sync + 'static>(&self, def: &StateDef<T>, value: T) -> OverrideToken {
        OverrideToken::push(self.cache.clone(), def.key(), CacheEntry::new(EntryKind::State, value))
    }

    pub fn slice<C, L>(&self, def: &StateDef<Option<C>>, lens: L) -> Slice<C, L>
    where
        C: Clone + Send + Sync + 'static,
        L: Lens<C>,
    {
        Slice::new(self.state(def), lens)
    }

    pub fn stored_slice<C, L>(&self, def: &StoredDef<Option<C>>, lens: L) -> Slice<C, L, StoredState<Option<C>>>
    where
        C: Clone + Send + Sync + 'static,
        Option<C>: Persist,
        L: Lens<C>,
    {
        Slice::new(self.stored_state(def), lens)
    }

    pub fn constant<C, L>(&self, def: &StateDef<Option<C>>, lens: L) -> Constant<C, L>
    where
        C: Clone + Send + Sync + 'static,
        L: Lens<C>,
    {
        Constant::new(self.state(def), lens)
    }

    pub fn remove_state<T>(&self, def: &StateDef<T>) -> bool {
        self.cache.remove(&def.key())
    }

    /// Drops the cached value and its persisted bytes.
    pub fn remove_stored_state<T>(&self, def: &StoredDef<T>) -> Result<(), AppError> {
        let key = def.key();
        let mut slots = self.cache.lock();
        slots.erase(&key);
        self.store.delete(&key.storage_key())
    }

    /// Forgets the resolved instance; the next resolution runs the factory again.
    pub fn remove_dependency<T>(&self, def: &DependencyDef<T>) -> bool {
        self.cache.remove(&def.key())
    }

    /// Clears every cached value and override. Persisted bytes are kept.
    pub fn reset(&self) {
        self.cache.clear();
    }

    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        self.cache.subscribe()
    }

    pub fn description(&self) -> String {
        let lines = self.cache.describe();
        if lines.is_empty() {
            return "Container {}".to_string();
        }
        format!("Container {{\n{}\n}}", lines.iter().map(|l| format!("  {}", l)).collect::<Vec<_>>().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LoggingSettings, StoreSettings};
    use crate::slice::Field;

    crate::state!(COUNT: u32 = 0);
    crate::stored_state!(TOKEN: Option<String> = None, id = "token");

    #[test]
    fn clones_share_one_cache() {
        let container = Container::new();
        let handle = container.clone();
        container.state(&COUNT).set(3);
        assert_eq!(handle.state(&COUNT).value(), 3);
    }

    #[test]
    fn separate_containers_are_isolated() {
        let a = Container::new();
        let b = Container::new();
        a.state(&COUNT).set(3);
        assert_eq!(b.state(&COUNT).value(), 0);
    }

    #[test]
    fn shared_is_a_single_instance() {
        assert!(Arc::ptr_eq(Container::shared().cache(), Container::shared().cache()));
    }

    #[test]
    fn remove_stored_state_clears_cache_and_store() {
        let store = MemoryStore::new();
        let container = Container::with_store(store.clone());
        container.stored_state(&TOKEN).set(Some("abc".into()));
        assert!(store.contains(&TOKEN.key().storage_key()));
        container.remove_stored_state(&TOKEN).unwrap();
        assert!(store.is_empty());
        assert_eq!(container.stored_state(&TOKEN).value(), None);
    }

    #[test]
    fn reset_keeps_persisted_bytes() {
        let container = Container::new();
        container.stored_state(&TOKEN).set(Some("abc".into()));
        container.state(&COUNT).set(1);
        container.reset();
        assert!(container.cache().is_empty());
        assert_eq!(container.stored_state(&TOKEN).value().as_deref(), Some("abc"));
        assert_eq!(container.state(&COUNT).value(), 0);
    }

    #[test]
    fn description_lists_live_entries() {
        let container = Container::new();
        assert_eq!(container.description(), "Container {}");
        container.state(&COUNT).set(1);
        assert_eq!(
            container.description(),
            format!("Container {{\n  State<u32> ({})\n}}", COUNT.key())
        );
    }

    #[test]
    fn stored_slice_writes_through_to_the_store() {
        const FIRST: Field<(u8, String), u8> = Field::new(|p| &p.0, |p| &mut p.0);
        crate::stored_state!(PAIR: Option<(u8, String)> = Some((1, "one".to_string())));
        let store = MemoryStore::new();
        let container = Container::with_store(store.clone());
        let mut first = container.stored_slice(&PAIR, FIRST);
        first.set(Some(2));
        assert_eq!(first.value(), Some(2));
        assert!(store.contains(&PAIR.key().storage_key()));
        container.reset();
        assert_eq!(container.stored_state(&PAIR).value(), Some((2, "one".to_string())));
    }

    #[test]
    fn redb_settings_require_a_path() {
        let settings = Settings {
            logging: LoggingSettings { enabled: false },
            store: StoreSettings { backend: StoreBackend::Redb, path: None },
        };
        assert!(matches!(Container::from_settings(&settings), Err(AppError::Custom(_))));
    }
}
