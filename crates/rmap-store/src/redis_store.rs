use std::collections::{BTreeSet, HashSet};

use redis::Commands;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::{HashStore, Record};

/// Hash store backed by a single Redis connection.
///
/// The connection is opened once, reused for every call, and released by
/// [`HashStore::close`] or when the store is dropped.
pub struct RedisHashStore {
    config: StoreConfig,
    conn: Option<redis::Connection>,
}

impl RedisHashStore {
    /// Connect to `host:port` and select the configured database.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let client = redis::Client::open(config.url())?;
        let conn = client.get_connection()?;
        info!(
            host = %config.host,
            port = config.port,
            database = config.database,
            "connected to redis"
        );
        Ok(Self {
            config: config.clone(),
            conn: Some(conn),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&mut self) -> StoreResult<&mut redis::Connection> {
        self.conn.as_mut().ok_or(StoreError::Closed)
    }
}

impl HashStore for RedisHashStore {
    fn hset(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let _: () = self.conn()?.hset(key, field, value)?;
        Ok(())
    }

    fn hset_multiple(&mut self, key: &str, entries: &[(String, String)]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let _: () = self.conn()?.hset_multiple(key, entries)?;
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> StoreResult<Option<String>> {
        Ok(self.conn()?.hget(key, field)?)
    }

    fn hgetall(&mut self, key: &str) -> StoreResult<Record> {
        Ok(self.conn()?.hgetall(key)?)
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        Ok(self.conn()?.exists(key)?)
    }

    fn keys(&mut self, pattern: &str) -> StoreResult<BTreeSet<String>> {
        let keys: HashSet<String> = self.conn()?.keys(pattern)?;
        Ok(keys.into_iter().collect())
    }

    fn delete(&mut self, key: &str) -> StoreResult<bool> {
        let removed: i64 = self.conn()?.del(key)?;
        Ok(removed > 0)
    }

    fn close(&mut self) -> StoreResult<()> {
        if self.conn.take().is_some() {
            debug!(host = %self.config.host, port = self.config.port, "redis connection closed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RedisHashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHashStore")
            .field("url", &self.config.url())
            .field("open", &self.is_open())
            .finish()
    }
}
