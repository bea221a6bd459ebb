pub mod memory;
pub mod redb_store;
pub mod blocking;

use std::future::Future;
use crate::AppError;

pub use blocking::BlockingStore;
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Durable key/value capability behind `StoredState`.
pub trait PersistentStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), AppError>;
    fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Async counterpart of `PersistentStore`; wrap it in a `BlockingStore` to use it.
pub trait AsyncPersistentStore: Send + Sync {
    fn read(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, AppError>> + Send;
    fn write(&self, key: &str, bytes: &[u8]) -> impl Future<Output = Result<(), AppError>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}
