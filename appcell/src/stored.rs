use std::fmt;
use std::sync::Arc;
use crate::cache::{CacheEntry, EntryKind, Slots};
use crate::state::MutableState;
use crate::store::PersistentStore;
use crate::{codec, debug, error, warn, AppError, Persist, ScopeKey, ScopedCache};

/// Scoped state written through to a `PersistentStore`.
///
/// Reads go cache, then store (decoded), then the initial factory. Writing the
/// type's absence (`None`) removes the value from both the cache and the store.
pub struct StoredState<T> {
    cache: Arc<ScopedCache>,
    store: Arc<dyn PersistentStore>,
    key: ScopeKey,
    storage_key: String,
    initial: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T: Persist> StoredState<T> {
    pub fn new(
        cache: Arc<ScopedCache>,
        store: Arc<dyn PersistentStore>,
        key: ScopeKey,
        initial: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let storage_key = key.storage_key();
        Self { cache, store, key, storage_key, initial: Arc::new(initial) }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn value(&self) -> T {
        let slots = self.cache.lock();
        self.read_locked(&slots)
    }

    /// Writes `value`, logging store or encoding failures. The cache is updated regardless.
    pub fn set(&mut self, value: T) {
        if let Err(e) = self.try_set(value) {
            error!("Persisting {} failed: {}", self.key, e);
        }
    }

    pub fn try_set(&mut self, value: T) -> Result<(), AppError> {
        let mut slots = self.cache.lock();
        self.write_locked(&mut slots, value)
    }

    /// Writes the initial value again; an absent initial value removes the entry entirely.
    pub fn reset(&mut self) {
        let initial = (self.initial)();
        self.set(initial);
    }

    /// Read-modify-write of the value beneath any active override.
    ///
    /// `f` runs without holding the cache lock, so it may read other cells; it is
    /// re-run when the key is written in the meantime. Store access and encoding
    /// still happen under the lock.
    pub fn update_with<F: FnMut(T) -> Option<T>>(&mut self, mut f: F) -> bool {
        loop {
            let (current, revision) = {
                let slots = self.cache.lock();
                (self.read_base_locked(&slots), slots.revision(&self.key))
            };
            let Some(next) = f(current) else {
                return false;
            };
            let mut slots = self.cache.lock();
            if slots.revision(&self.key) != revision {
                debug!("{} changed during update, retrying", self.key);
                continue;
            }
            if let Err(e) = self.write_locked(&mut slots, next) {
                error!("Persisting {} failed: {}", self.key, e);
            }
            return true;
        }
    }

    fn read_locked(&self, slots: &Slots) -> T {
        match slots.get::<T>(&self.key) {
            Some(cached) => cached,
            None => self.read_store(),
        }
    }

    fn read_base_locked(&self, slots: &Slots) -> T {
        match slots.base::<T>(&self.key) {
            Some(cached) => cached,
            None => self.read_store(),
        }
    }

    fn read_store(&self) -> T {
        match self.store.read(&self.storage_key) {
            Ok(Some(bytes)) => match codec::decode::<T>(&self.storage_key, &bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!("{}; using initial value", e);
                    (self.initial)()
                }
            },
            Ok(None) => (self.initial)(),
            Err(e) => {
                error!("Reading {} from store failed: {}", self.storage_key, e);
                (self.initial)()
            }
        }
    }

    fn write_locked(&self, slots: &mut Slots, value: T) -> Result<(), AppError> {
        if value.is_absent() {
            debug!("{} set to absence, removing", self.key);
            slots.erase(&self.key);
            return self.store.delete(&self.storage_key);
        }
        let bytes = codec::encode(&value);
        slots.write(self.key.clone(), CacheEntry::new(EntryKind::Stored, value));
        self.store.write(&self.storage_key, &bytes?)
    }
}

impl<T: Persist> MutableState<T> for StoredState<T> {
    fn value(&self) -> T {
        StoredState::value(self)
    }

    fn set(&mut self, value: T) {
        StoredState::set(self, value)
    }

    fn update_with<F: FnMut(T) -> Option<T>>(&mut self, f: F) -> bool {
        StoredState::update_with(self, f)
    }
}

impl<T: Persist + fmt::Debug> fmt::Debug for StoredState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredState<{}>({:?}) ({})", std::any::type_name::<T>(), self.value(), self.key)
    }
}
