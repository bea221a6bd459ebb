//! appcell is a type-safe scoped container: transient state, persisted state and lazily built
//! dependencies live in one thread-safe cache keyed by `ScopeKey`.
//!
//! Persisted state writes through to a `PersistentStore` (in memory, [Redb](https://github.com/cberner/redb),
//! or any async store behind `BlockingStore`), encoded as JSON with a `bincode` fallback.
//! Dependencies can be overridden with stacked, cancellable tokens, and slices give read/write
//! views of single fields of an optional composite state.
//!

extern crate self as appcell;

pub mod absence;
pub mod cache;
pub mod codec;
pub mod container;
pub mod definition;
pub mod dependency;
pub mod error;
pub mod logger;
pub mod macro_rules;
pub mod overrides;
pub mod scope;
pub mod settings;
pub mod slice;
pub mod state;
pub mod store;
pub mod stored;

pub use absence::{Absence, Persist};
pub use cache::{CacheEntry, Change, ChangeEvent, EntryKind, ScopedCache};
pub use container::Container;
pub use crossbeam::channel::Receiver;
pub use definition::{DependencyDef, StateDef, StoredDef};
pub use dependency::Dependency;
pub use error::AppError;
pub use macros::Absence;
pub use macros::Lenses;
pub use overrides::OverrideToken;
pub use scope::ScopeKey;
pub use settings::{load_config, LoggingSettings, Settings, StoreBackend, StoreSettings};
pub use slice::{Constant, Field, Lens, OptionalField, Slice};
pub use state::{MutableState, State};
pub use store::{AsyncPersistentStore, BlockingStore, MemoryStore, PersistentStore, RedbStore};
pub use stored::StoredState;
pub use serde;
