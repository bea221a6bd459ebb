use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, fs};
use redb::{Database, ReadableTable, TableDefinition, TableError};
use crate::store::PersistentStore;
use crate::{info, AppError};

const STATE_TABLE: TableDefinition<'static, &str, &[u8]> = TableDefinition::new("appcell_state");

/// `PersistentStore` over a single redb table. Every write commits its own transaction.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    path: PathBuf,
}

impl RedbStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let db = if path.exists() {
            info!("Opening existing state db at {:?}", path);
            Database::open(&path)?
        } else {
            Database::create(&path)?
        };
        Ok(Self { db: Arc::new(db), path })
    }

    /// Fresh database under the system temp dir, suffixed with a random number.
    pub fn temp(name: &str) -> Result<Self, AppError> {
        let db_name = format!("{}_{}", name, rand::random::<u64>());
        let db_path = env::temp_dir().join("appcell").join(db_name).join("state.db");
        Self::open(db_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for RedbStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let read_tx = self.db.begin_read()?;
        let table = match read_tx.open_table(STATE_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let write_tx = self.db.begin_write()?;
        {
            let mut table = write_tx.open_table(STATE_TABLE)?;
            table.insert(key, bytes)?;
        }
        write_tx.commit()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        let write_tx = self.db.begin_write()?;
        {
            let mut table = write_tx.open_table(STATE_TABLE)?;
            table.remove(key)?;
        }
        write_tx.commit()?;
        Ok(())
    }
}
