use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Declares whether a value is its type's "no value" representation. Writing an
/// absent value into a `StoredState` deletes the persisted entry instead of storing it.
pub trait Absence {
    fn is_absent(&self) -> bool {
        false
    }
}

impl<T> Absence for Option<T> {
    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

macro_rules! always_present {
    ($($t:ty),* $(,)?) => {
        $(impl Absence for $t {})*
    };
}

always_present!(
    (), bool, char, String,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
);

impl<T> Absence for Vec<T> {}
impl<T> Absence for VecDeque<T> {}
impl<T> Absence for Box<T> {}
impl<T, const N: usize> Absence for [T; N] {}
impl<K, V, S> Absence for HashMap<K, V, S> {}
impl<T, S> Absence for HashSet<T, S> {}
impl<K, V> Absence for BTreeMap<K, V> {}
impl<T> Absence for BTreeSet<T> {}
impl<A, B> Absence for (A, B) {}
impl<A, B, C> Absence for (A, B, C) {}

/// Everything a `StoredState` value needs.
pub trait Persist: Serialize + DeserializeOwned + Absence + Clone + Send + Sync + 'static {}

impl<T> Persist for T where T: Serialize + DeserializeOwned + Absence + Clone + Send + Sync + 'static {}
