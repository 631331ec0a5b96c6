use crate::domain::basket::{Basket, BasketId};
use crate::domain::ports::BasketStore;
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family holding one JSON record per basket, items included.
pub const CF_BASKETS: &str = "baskets";

/// A persistent basket store backed by RocksDB.
///
/// Each basket is a single key (its big-endian id), so the basket and its
/// items are always written by one `put`. Writes are serialised through a
/// mutex so the version check and the write cannot interleave.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbBasketStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbBasketStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_baskets = ColumnFamilyDescriptor::new(CF_BASKETS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_baskets]).map_err(internal)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: BasketId) -> Result<Option<Basket>> {
        let cf = self.db.cf_handle(CF_BASKETS).ok_or_else(missing_cf)?;
        match self.db.get_cf(cf, id.0.to_be_bytes()).map_err(internal)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, basket: &Basket) -> Result<()> {
        let cf = self.db.cf_handle(CF_BASKETS).ok_or_else(missing_cf)?;
        let value = serde_json::to_vec(basket)?;
        self.db
            .put_cf(cf, basket.id().0.to_be_bytes(), value)
            .map_err(internal)
    }
}

#[async_trait]
impl BasketStore for RocksDbBasketStore {
    async fn save(&self, basket: &Basket) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let found = self.read(basket.id())?.map_or(0, |stored| stored.version());
        if found != basket.version() {
            return Err(TransferError::ConcurrentModification {
                id: basket.id(),
                expected: basket.version(),
                found,
            });
        }

        let mut stored = basket.clone();
        stored.set_version(found + 1);
        self.write(&stored)?;
        Ok(found + 1)
    }

    async fn load(&self, id: BasketId) -> Result<Option<Basket>> {
        Ok(self.read(id)?.filter(|basket| !basket.is_deleted()))
    }

    async fn load_with_deleted(&self, id: BasketId) -> Result<Option<Basket>> {
        self.read(id)
    }

    async fn soft_delete(&self, id: BasketId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut basket = self.read(id)?.ok_or(TransferError::NotFound(id))?;
        if !basket.is_deleted() {
            basket.mark_deleted(Utc::now());
            basket.set_version(basket.version() + 1);
            self.write(&basket)?;
        }
        Ok(())
    }
}

fn internal(err: rocksdb::Error) -> TransferError {
    TransferError::InternalError(Box::new(err))
}

fn missing_cf() -> TransferError {
    TransferError::InternalError(Box::new(std::io::Error::other(
        "Baskets column family not found",
    )))
}
