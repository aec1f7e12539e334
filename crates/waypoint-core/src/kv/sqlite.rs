//! SQLite-backed key-value store.
//!
//! Hashes, sets and sorted sets each get a table keyed by `(key, ...)`. A
//! primitive that touches more than one row runs inside its own transaction
//! so it stays atomic, matching the single-command guarantee of a server.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use super::{KeyValue, KvError, KvResult};

const HSET_SQL: &str = "INSERT INTO kv_hash (key, field, value) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key, field) DO UPDATE SET value = excluded.value";
const HGET_SQL: &str = "SELECT value FROM kv_hash WHERE key = ?1 AND field = ?2";
const HGETALL_SQL: &str = "SELECT field, value FROM kv_hash WHERE key = ?1";
const EXISTS_SQL: &str = "SELECT EXISTS(SELECT 1 FROM kv_hash WHERE key = ?1) \
     OR EXISTS(SELECT 1 FROM kv_set WHERE key = ?1) \
     OR EXISTS(SELECT 1 FROM kv_zset WHERE key = ?1)";
const DEL_HASH_SQL: &str = "DELETE FROM kv_hash WHERE key = ?1";
const DEL_SET_SQL: &str = "DELETE FROM kv_set WHERE key = ?1";
const DEL_ZSET_SQL: &str = "DELETE FROM kv_zset WHERE key = ?1";
const SADD_SQL: &str = "INSERT OR IGNORE INTO kv_set (key, member) VALUES (?1, ?2)";
const SREM_SQL: &str = "DELETE FROM kv_set WHERE key = ?1 AND member = ?2";
const SMEMBERS_SQL: &str = "SELECT member FROM kv_set WHERE key = ?1 ORDER BY member";
const SISMEMBER_SQL: &str = "SELECT EXISTS(SELECT 1 FROM kv_set WHERE key = ?1 AND member = ?2)";
const ZADD_SQL: &str = "INSERT INTO kv_zset (key, member, score) VALUES (?1, ?2, ?3) \
     ON CONFLICT(key, member) DO UPDATE SET score = excluded.score";
const ZREM_SQL: &str = "DELETE FROM kv_zset WHERE key = ?1 AND member = ?2";
const ZCARD_SQL: &str = "SELECT COUNT(*) FROM kv_zset WHERE key = ?1";
const ZSCORE_SQL: &str = "SELECT score FROM kv_zset WHERE key = ?1 AND member = ?2";
const ZRANGE_SQL: &str =
    "SELECT member, score FROM kv_zset WHERE key = ?1 ORDER BY score ASC, member ASC";
const SCAN_SQL: &str = "SELECT key FROM kv_hash WHERE substr(key, 1, ?2) = ?1 \
     UNION SELECT key FROM kv_set WHERE substr(key, 1, ?2) = ?1 \
     UNION SELECT key FROM kv_zset WHERE substr(key, 1, ?2) = ?1 \
     ORDER BY 1";

/// Key-value store persisted in a single SQLite database file.
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and initializes the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> KvResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// An in-memory SQLite database; mostly useful in tests.
    pub fn open_in_memory() -> KvResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> KvResult<Self> {
        connection.busy_timeout(std::time::Duration::from_secs(5))?;

        let schema_sql = include_str!("../../assets/schema.sql");
        connection.execute_batch(schema_sql)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn conn(&self) -> KvResult<MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| KvError::Poisoned)
    }
}

impl KeyValue for SqliteStore {
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> KvResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(HSET_SQL)?;
            for (field, value) in fields {
                stmt.execute(params![key, field, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(HGET_SQL, params![key, field], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(HGETALL_SQL)?;
        let fields = stmt
            .query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<String, String>, _>>()?;
        Ok(fields)
    }

    fn exists(&self, key: &str) -> KvResult<bool> {
        let conn = self.conn()?;
        Ok(conn.query_row(EXISTS_SQL, params![key], |row| row.get(0))?)
    }

    fn del(&self, key: &str) -> KvResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute(DEL_HASH_SQL, params![key])?
            + tx.execute(DEL_SET_SQL, params![key])?
            + tx.execute(DEL_ZSET_SQL, params![key])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.execute(SADD_SQL, params![key, member])?;
        Ok(())
    }

    fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.execute(SREM_SQL, params![key, member])?;
        Ok(())
    }

    fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(SMEMBERS_SQL)?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(members)
    }

    fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        let conn = self.conn()?;
        Ok(conn.query_row(SISMEMBER_SQL, params![key, member], |row| row.get(0))?)
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> KvResult<()> {
        self.conn()?.execute(ZADD_SQL, params![key, member, score])?;
        Ok(())
    }

    fn zrem(&self, key: &str, member: &str) -> KvResult<()> {
        self.conn()?.execute(ZREM_SQL, params![key, member])?;
        Ok(())
    }

    fn zcard(&self, key: &str) -> KvResult<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(ZCARD_SQL, params![key], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn zscore(&self, key: &str, member: &str) -> KvResult<Option<f64>> {
        let conn = self.conn()?;
        let score = conn
            .query_row(ZSCORE_SQL, params![key, member], |row| row.get(0))
            .optional()?;
        Ok(score)
    }

    fn zrange_withscores(&self, key: &str) -> KvResult<Vec<(String, f64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(ZRANGE_SQL)?;
        let entries = stmt
            .query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, f64)>, _>>()?;
        Ok(entries)
    }

    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(SCAN_SQL)?;
        let keys = stmt
            .query_map(params![prefix, prefix.chars().count() as i64], |row| {
                row.get(0)
            })?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}
