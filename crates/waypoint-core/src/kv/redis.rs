//! Redis implementation for production persistence.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use ::redis::Commands;

use super::{KeyValue, KvError, KvResult};

/// Key-value store backed by a Redis server.
///
/// The connection is shared behind a mutex; every trait method maps onto a
/// single Redis command.
pub struct RedisStore {
    connection: Mutex<::redis::Connection>,
}

impl RedisStore {
    /// Connects to the server at `connection_url` (`redis://host:port/db`).
    pub fn connect(connection_url: &str) -> KvResult<Self> {
        let client = ::redis::Client::open(connection_url)?;
        let connection = client.get_connection()?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn conn(&self) -> KvResult<MutexGuard<'_, ::redis::Connection>> {
        self.connection.lock().map_err(|_| KvError::Poisoned)
    }
}

impl KeyValue for RedisStore {
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> KvResult<()> {
        self.conn()?.hset_multiple::<_, _, _, ()>(key, fields)?;
        Ok(())
    }

    fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        Ok(self.conn()?.hget(key, field)?)
    }

    fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        Ok(self.conn()?.hgetall(key)?)
    }

    fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(self.conn()?.exists(key)?)
    }

    fn del(&self, key: &str) -> KvResult<bool> {
        let removed: usize = self.conn()?.del(key)?;
        Ok(removed > 0)
    }

    fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.sadd::<_, _, ()>(key, member)?;
        Ok(())
    }

    fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.srem::<_, _, ()>(key, member)?;
        Ok(())
    }

    fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut members: Vec<String> = self.conn()?.smembers(key)?;
        members.sort();
        Ok(members)
    }

    fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        Ok(self.conn()?.sismember(key, member)?)
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> KvResult<()> {
        self.conn()?.zadd::<_, _, _, ()>(key, member, score)?;
        Ok(())
    }

    fn zrem(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.zrem::<_, _, ()>(key, member)?;
        Ok(())
    }

    fn zcard(&self, key: &str) -> KvResult<usize> {
        Ok(self.conn()?.zcard(key)?)
    }

    fn zscore(&self, key: &str, member: &str) -> KvResult<Option<f64>> {
        Ok(self.conn()?.zscore(key, member)?)
    }

    fn zrange_withscores(&self, key: &str) -> KvResult<Vec<(String, f64)>> {
        Ok(self.conn()?.zrange_withscores(key, 0, -1)?)
    }

    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        let pattern = format!("{prefix}*");
        let mut conn = self.conn()?;
        let mut keys: Vec<String> = conn.scan_match::<_, String>(pattern)?.collect();
        keys.sort();
        Ok(keys)
    }
}
