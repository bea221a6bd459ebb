use crate::{Container, ScopeKey};


pub struct StateDef<T> {
    pub owner: &'static str,
    pub id: &'static str,
    initial: fn() -> T,
}

impl<T> StateDef<T> {
    pub const fn new(owner: &'static str, id: &'static str, initial: fn() -> T) -> Self {
        Self { owner, id, initial }
    }

    pub fn key(&self) -> ScopeKey {
        ScopeKey::new(self.owner, self.id)
    }

    pub fn initial(&self) -> T {
        (self.initial)()
    }
}

pub struct StoredDef<T> {
    pub owner: &'static str,
    pub id: &'static str,
    initial: fn() -> T,
}

impl<T> StoredDef<T> {
    pub const fn new(owner: &'static str, id: &'static str, initial: fn() -> T) -> Self {
        Self { owner, id, initial }
    }

    pub fn key(&self) -> ScopeKey {
        ScopeKey::new(self.owner, self.id)
    }

    pub fn factory(&self) -> fn() -> T {
        self.initial
    }
}

/// The factory receives the resolving container so it can pull in other dependencies.
pub struct DependencyDef<T> {
    pub owner: &'static str,
    pub id: &'static str,
    factory: fn(&Container) -> T,
}

impl<T> DependencyDef<T> {
    pub const fn new(owner: &'static str, id: &'static str, factory: fn(&Container) -> T) -> Self {
        Self { owner, id, factory }
    }

    pub fn key(&self) -> ScopeKey {
        ScopeKey::new(self.owner, self.id)
    }

    pub fn factory(&self) -> fn(&Container) -> T {
        self.factory
    }
}
