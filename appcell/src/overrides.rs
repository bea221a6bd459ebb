use std::sync::Arc;
use crate::cache::CacheEntry;
use crate::{error, AppError, ScopedCache, ScopeKey};

struct OverrideEntry {
    token: u64,
    value: CacheEntry,
    previous: Option<CacheEntry>,
}

/// What cancelling an override leaves to be done with the cache slot.
pub(crate) enum Restore {
    /// The cancelled entry was on top; its captured predecessor goes back into the slot.
    Slot(Option<CacheEntry>),
    /// The cancelled entry sat below another one, which inherited its predecessor.
    Relinked,
}

/// Per-key stack of substituted values, bottom first.
#[derive(Default)]
pub(crate) struct OverrideStack {
    entries: Vec<OverrideEntry>,
}

impl OverrideStack {
    pub(crate) fn push(&mut self, token: u64, value: CacheEntry, previous: Option<CacheEntry>) {
        self.entries.push(OverrideEntry { token, value, previous });
    }

    pub(crate) fn top(&self) -> Option<&CacheEntry> {
        self.entries.last().map(|e| &e.value)
    }

    /// Value captured beneath the bottom entry.
    pub(crate) fn base(&self) -> Option<&CacheEntry> {
        self.entries.first().and_then(|e| e.previous.as_ref())
    }

    /// Replaces the value beneath the bottom entry, returning the old one.
    pub(crate) fn set_base(&mut self, entry: Option<CacheEntry>) -> Option<CacheEntry> {
        match self.entries.first_mut() {
            Some(bottom) => std::mem::replace(&mut bottom.previous, entry),
            None => entry,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unlinks the entry pushed with `token`, wherever it sits. `None` if unknown.
    pub(crate) fn cancel(&mut self, token: u64) -> Option<Restore> {
        let pos = self.entries.iter().position(|e| e.token == token)?;
        let removed = self.entries.remove(pos);
        match self.entries.get_mut(pos) {
            Some(above) => {
                above.previous = removed.previous;
                Some(Restore::Relinked)
            }
            None => Some(Restore::Slot(removed.previous)),
        }
    }
}

/// Handle to one override push. Cancelling restores whatever was resolvable
/// before the push; dropping an uncancelled token cancels it as well.
#[must_use = "dropping an OverrideToken cancels the override immediately"]
pub struct OverrideToken {
    cache: Arc<ScopedCache>,
    key: ScopeKey,
    token: u64,
    active: bool,
}

impl OverrideToken {
    pub(crate) fn push(cache: Arc<ScopedCache>, key: ScopeKey, entry: CacheEntry) -> Self {
        let token = cache.push_override(&key, entry);
        Self { cache, key, token, active: true }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn id(&self) -> u64 {
        self.token
    }

    pub fn cancel(mut self) -> Result<(), AppError> {
        self.active = false;
        self.cache.cancel_override(&self.key, self.token)
    }
}

impl Drop for OverrideToken {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(e) = self.cache.cancel_override(&self.key, self.token) {
                error!("Dropping override failed: {}", e);
            }
        }
    }
}
