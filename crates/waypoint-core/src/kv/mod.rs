//! Key-value primitives the stores are built on.
//!
//! The stores only ever talk to a [`KeyValue`] implementation, which exposes
//! three data shapes under string keys:
//!
//! - **hashes**: field/value records (`plan:<id>`, `task:<id>`)
//! - **sets**: unordered membership (`plans`, `app:<id>:plans`)
//! - **sorted sets**: member to score ordering (`plan_tasks:<id>`)
//!
//! Every method is a single atomic call against the backend. Nothing here
//! spans more than one key, so callers composing several calls must cope with
//! interleaving on their own.
//!
//! Backends:
//!
//! - [`MemoryStore`]: process-local maps, used by tests and `--memory` runs
//! - [`SqliteStore`]: a single SQLite file holding three tables
//! - `RedisStore`: native Redis commands (cargo feature `redis`)

use std::collections::HashMap;

use thiserror::Error;

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
pub mod sqlite;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use sqlite::SqliteStore;

/// Errors raised by a key-value backend.
#[derive(Error, Debug)]
pub enum KvError {
    /// SQLite backend failure
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Redis backend failure
    #[cfg(feature = "redis")]
    #[error("redis: {0}")]
    Redis(#[from] ::redis::RedisError),
    /// A thread panicked while holding the backend lock
    #[error("backend lock poisoned")]
    Poisoned,
    /// The backend refused or could not serve the call
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for backend calls
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Atomic key-value primitives in the style of a Redis client.
///
/// Missing keys behave like empty containers: `hgetall` returns an empty map,
/// `smembers` an empty list, `zcard` zero.
pub trait KeyValue: Send + Sync {
    /// Sets the given fields on a hash, creating it if needed.
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> KvResult<()>;

    /// Reads one field of a hash.
    fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>>;

    /// Reads every field of a hash.
    fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>>;

    /// Whether any value is stored under `key`.
    fn exists(&self, key: &str) -> KvResult<bool>;

    /// Removes `key` whatever its type. Returns whether something was removed.
    fn del(&self, key: &str) -> KvResult<bool>;

    fn sadd(&self, key: &str, member: &str) -> KvResult<()>;

    fn srem(&self, key: &str, member: &str) -> KvResult<()>;

    fn smembers(&self, key: &str) -> KvResult<Vec<String>>;

    fn sismember(&self, key: &str, member: &str) -> KvResult<bool>;

    /// Inserts `member` or updates its score.
    fn zadd(&self, key: &str, member: &str, score: f64) -> KvResult<()>;

    fn zrem(&self, key: &str, member: &str) -> KvResult<()>;

    fn zcard(&self, key: &str) -> KvResult<usize>;

    fn zscore(&self, key: &str, member: &str) -> KvResult<Option<f64>>;

    /// All members ascending by score, ties broken by member.
    fn zrange_withscores(&self, key: &str) -> KvResult<Vec<(String, f64)>>;

    /// Every key starting with `prefix`.
    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<String>>;
}

/// Orders `(member, score)` pairs the way a sorted set reports them.
pub(crate) fn sort_by_score(entries: &mut [(String, f64)]) {
    entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
}
