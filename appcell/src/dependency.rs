use std::fmt;
use std::sync::Arc;
use once_cell::sync::OnceCell;
use crate::cache::{Change, CacheEntry};
use crate::{debug, warn, Container, ScopeKey};

/// Lazily constructed, shared instance per scope.
///
/// Resolution order: top override, then the cached instance, then the factory.
/// The factory runs at most once per key between cache clears, also when many
/// threads race on the first resolution, and it runs outside the cache lock so it
/// may resolve other dependencies.
pub struct Dependency<T> {
    container: Container,
    key: ScopeKey,
    factory: Arc<dyn Fn(&Container) -> T + Send + Sync>,
}

impl<T> Clone for Dependency<T> {
    fn clone(&self) -> Self {
        Self { container: self.container.clone(), key: self.key.clone(), factory: self.factory.clone() }
    }
}

enum Lookup<T> {
    Overridden(T),
    Slot { slot: Arc<OnceCell<T>>, created: bool },
    Mismatch,
}

impl<T: Clone + Send + Sync + 'static> Dependency<T> {
    pub fn new(container: Container, key: ScopeKey, factory: impl Fn(&Container) -> T + Send + Sync + 'static) -> Self {
        Self { container, key, factory: Arc::new(factory) }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn value(&self) -> T {
        match self.lookup() {
            Lookup::Overridden(value) => value,
            Lookup::Slot { slot, created } => {
                let value = slot
                    .get_or_init(|| {
                        debug!("constructing {}", self.key);
                        (self.factory)(&self.container)
                    })
                    .clone();
                if created {
                    self.announce(slot);
                }
                value
            }
            Lookup::Mismatch => {
                warn!("{} is cached with another type, building an unshared instance", self.key);
                (self.factory)(&self.container)
            }
        }
    }

    /// Emits the first resolution, unless the slot was dropped or replaced while the factory ran.
    fn announce(&self, slot: Arc<OnceCell<T>>) {
        let mut slots = self.container.cache().lock();
        let live = slots
            .entry(&self.key)
            .and_then(|entry| entry.as_slot::<T>())
            .is_some_and(|cached| Arc::ptr_eq(&cached, &slot));
        if live {
            slots.emit(self.key.clone(), Change::Set(CacheEntry::slot(slot)));
        } else {
            debug!("{} was dropped while constructing, not announcing it", self.key);
        }
    }

    fn lookup(&self) -> Lookup<T> {
        let mut slots = self.container.cache().lock();
        if let Some(value) = slots.top_override::<T>(&self.key) {
            return Lookup::Overridden(value);
        }
        match slots.entry(&self.key) {
            Some(entry) => match entry.as_slot::<T>() {
                Some(slot) => Lookup::Slot { slot, created: false },
                None => Lookup::Mismatch,
            },
            None => {
                let slot = Arc::new(OnceCell::new());
                slots.insert_silent(self.key.clone(), CacheEntry::slot(slot.clone()));
                Lookup::Slot { slot, created: true }
            }
        }
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for Dependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency<{}>({:?}) ({})", std::any::type_name::<T>(), self.value(), self.key)
    }
}
