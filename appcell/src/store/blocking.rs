//! Synchronous facade over an `AsyncPersistentStore`.
//!
//! `StoredState` reads and writes synchronously. An async-only backend is driven
//! through a private current-thread runtime; calling into a `BlockingStore` from
//! inside another tokio runtime panics, as `Runtime::block_on` does.

use tokio::runtime::{Builder, Runtime};
use crate::store::{AsyncPersistentStore, PersistentStore};
use crate::AppError;

pub struct BlockingStore<S> {
    inner: S,
    runtime: Runtime,
}

impl<S: AsyncPersistentStore> BlockingStore<S> {
    pub fn new(inner: S) -> Result<Self, AppError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { inner, runtime })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: AsyncPersistentStore> PersistentStore for BlockingStore<S> {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.runtime.block_on(self.inner.read(key))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        self.runtime.block_on(self.inner.write(key, bytes))
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        self.runtime.block_on(self.inner.delete(key))
    }
}
