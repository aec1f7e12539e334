#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use waypoint_core::{
    kv::{KeyValue, KvError, KvResult, MemoryStore, SqliteStore},
    store::{keys, open_stores, PlanStore, TaskStore},
    PlannerBuilder,
};

/// Helper function to create a test planner backed by a temp SQLite file
pub async fn create_test_planner() -> (TempDir, waypoint_core::Planner) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let planner = PlannerBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create planner");
    (temp_dir, planner)
}

/// One backend under test. The temp dir keeps SQLite files alive.
pub struct Backend {
    pub name: &'static str,
    pub kv: Arc<dyn KeyValue>,
    _dir: Option<TempDir>,
}

impl Backend {
    pub fn stores(&self) -> (PlanStore, TaskStore) {
        open_stores(Arc::clone(&self.kv))
    }
}

/// Every backend that needs no external service.
pub fn backends() -> Vec<Backend> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let sqlite = SqliteStore::open(dir.path().join("kv.db")).expect("Failed to open sqlite");
    vec![
        Backend {
            name: "memory",
            kv: Arc::new(MemoryStore::new()),
            _dir: None,
        },
        Backend {
            name: "sqlite",
            kv: Arc::new(sqlite),
            _dir: Some(dir),
        },
    ]
}

/// Asserts that a plan's orders are exactly `0..n` in both records and index.
pub fn assert_dense(kv: &dyn KeyValue, tasks: &TaskStore, plan_id: &str, context: &str) {
    let listed = tasks.list_by_plan(plan_id).expect("list");
    for (position, task) in listed.iter().enumerate() {
        assert_eq!(task.order as usize, position, "{context}: order of {}", task.id);
        let score = kv
            .zscore(&keys::plan_tasks(plan_id), &task.id)
            .expect("zscore")
            .expect("indexed");
        assert_eq!(score, position as f64, "{context}: score of {}", task.id);
    }
}

#[derive(Debug)]
struct Fault {
    op: &'static str,
    key_prefix: String,
    skip: usize,
}

/// In-memory backend that fails selected calls on demand.
///
/// A fault matches calls of one primitive whose key starts with a prefix. It
/// lets `skip` matching calls through, then fails every later one until
/// [`FlakyStore::heal`] is called.
///
/// It can also delete a key right after it is first read, which stands in
/// for a delete from another caller landing mid-operation.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    faults: Mutex<Vec<Fault>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    vanishing: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: &'static str, key_prefix: &str) {
        self.fail_after(op, key_prefix, 0);
    }

    pub fn fail_after(&self, op: &'static str, key_prefix: &str, skip: usize) {
        self.faults.lock().unwrap().push(Fault {
            op,
            key_prefix: key_prefix.to_string(),
            skip,
        });
    }

    /// Deletes `key` after the next `hgetall` of it has returned.
    pub fn vanish_after_read(&self, key: &str) {
        self.vanishing.lock().unwrap().push(key.to_string());
    }

    pub fn heal(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    fn check(&self, op: &'static str, key: &str) -> KvResult<()> {
        *self.calls.lock().unwrap().entry(op).or_default() += 1;

        let mut faults = self.faults.lock().unwrap();
        for fault in faults.iter_mut() {
            if fault.op == op && key.starts_with(&fault.key_prefix) {
                if fault.skip > 0 {
                    fault.skip -= 1;
                    return Ok(());
                }
                return Err(KvError::Unavailable(format!("injected {op} failure on {key}")));
            }
        }
        Ok(())
    }
}

impl KeyValue for FlakyStore {
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> KvResult<()> {
        self.check("hset", key)?;
        self.inner.hset(key, fields)
    }

    fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        self.check("hget", key)?;
        self.inner.hget(key, field)
    }

    fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        self.check("hgetall", key)?;
        let fields = self.inner.hgetall(key)?;

        let mut vanishing = self.vanishing.lock().unwrap();
        if let Some(index) = vanishing.iter().position(|k| k == key) {
            vanishing.remove(index);
            self.inner.del(key)?;
        }
        Ok(fields)
    }

    fn exists(&self, key: &str) -> KvResult<bool> {
        self.check("exists", key)?;
        self.inner.exists(key)
    }

    fn del(&self, key: &str) -> KvResult<bool> {
        self.check("del", key)?;
        self.inner.del(key)
    }

    fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        self.check("sadd", key)?;
        self.inner.sadd(key, member)
    }

    fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        self.check("srem", key)?;
        self.inner.srem(key, member)
    }

    fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        self.check("smembers", key)?;
        self.inner.smembers(key)
    }

    fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        self.check("sismember", key)?;
        self.inner.sismember(key, member)
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> KvResult<()> {
        self.check("zadd", key)?;
        self.inner.zadd(key, member, score)
    }

    fn zrem(&self, key: &str, member: &str) -> KvResult<()> {
        self.check("zrem", key)?;
        self.inner.zrem(key, member)
    }

    fn zcard(&self, key: &str) -> KvResult<usize> {
        self.check("zcard", key)?;
        self.inner.zcard(key)
    }

    fn zscore(&self, key: &str, member: &str) -> KvResult<Option<f64>> {
        self.check("zscore", key)?;
        self.inner.zscore(key, member)
    }

    fn zrange_withscores(&self, key: &str) -> KvResult<Vec<(String, f64)>> {
        self.check("zrange_withscores", key)?;
        self.inner.zrange_withscores(key)
    }

    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        self.check("scan_prefix", prefix)?;
        self.inner.scan_prefix(prefix)
    }
}
