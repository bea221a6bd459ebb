use std::any::type_name;
use std::borrow::Cow;
use std::fmt;

/// Identifies the slot an accessor reads and writes. Two accessors share a value
/// iff both owner and discriminator are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey {
    owner: Cow<'static, str>,
    discriminator: Cow<'static, str>,
}

impl ScopeKey {
    pub fn new(owner: impl Into<Cow<'static, str>>, discriminator: impl Into<Cow<'static, str>>) -> Self {
        Self { owner: owner.into(), discriminator: discriminator.into() }
    }

    /// Key owned by the type `Owner`, e.g. `ScopeKey::of::<Settings>("theme")`.
    pub fn of<Owner: ?Sized + 'static>(discriminator: impl Into<Cow<'static, str>>) -> Self {
        Self::new(type_name::<Owner>(), discriminator)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// The string under which a persisted value is kept in a `PersistentStore`.
    pub fn storage_key(&self) -> String {
        format!("{}.{}", self.owner, self.discriminator)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.discriminator)
    }
}
