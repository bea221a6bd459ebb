use std::fmt;
use std::sync::Arc;
use crate::cache::EntryKind;
use crate::{ScopeKey, ScopedCache};

/// Read/write access shared by `State`, `StoredState` and anything a `Slice` can sit on.
pub trait MutableState<T> {
    fn value(&self) -> T;
    fn set(&mut self, value: T);
    /// Read-modify-write without lost updates; `f` returns `None` to leave the value
    /// untouched. Returns whether a write happened.
    ///
    /// `f` runs outside the cache lock and may read other cells of the same container.
    /// It is re-run if the key is written concurrently, so it should only compute.
    fn update_with<F: FnMut(T) -> Option<T>>(&mut self, f: F) -> bool;
}

/// Transient scoped state. The cache is the source of truth once any accessor of
/// the same key has written; before that, reads see this cell's initial value.
/// An active override wins over both, and writes made meanwhile apply once it is cancelled.
pub struct State<T> {
    cache: Arc<ScopedCache>,
    key: ScopeKey,
    initial: T,
}

impl<T: Clone + Send + Sync + 'static> State<T> {
    pub fn new(cache: Arc<ScopedCache>, key: ScopeKey, initial: T) -> Self {
        Self { cache, key, initial }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn value(&self) -> T {
        let slots = self.cache.lock();
        slots
            .top_override::<T>(&self.key)
            .or_else(|| slots.get::<T>(&self.key))
            .unwrap_or_else(|| self.initial.clone())
    }

    pub fn set(&mut self, value: T) {
        self.initial = value.clone();
        self.cache.set(&self.key, EntryKind::State, value);
    }

    pub fn update(&mut self, mut f: impl FnMut(&mut T)) {
        self.update_with(|mut value| {
            f(&mut value);
            Some(value)
        });
    }

    pub fn update_with<F: FnMut(T) -> Option<T>>(&mut self, f: F) -> bool {
        let initial = self.initial.clone();
        match self.cache.update(&self.key, EntryKind::State, || initial.clone(), f) {
            Some(written) => {
                self.initial = written;
                true
            }
            None => false,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> MutableState<T> for State<T> {
    fn value(&self) -> T {
        State::value(self)
    }

    fn set(&mut self, value: T) {
        State::set(self, value)
    }

    fn update_with<F: FnMut(T) -> Option<T>>(&mut self, f: F) -> bool {
        State::update_with(self, f)
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State<{}>({:?}) ({})", std::any::type_name::<T>(), self.value(), self.key)
    }
}
