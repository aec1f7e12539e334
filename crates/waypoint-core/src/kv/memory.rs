//! In-process key-value backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use super::{sort_by_score, KeyValue, KvError, KvResult};

#[derive(Debug, Clone)]
enum Value {
    Hash(HashMap<String, String>),
    Set(BTreeSet<String>),
    SortedSet(HashMap<String, f64>),
}

/// Process-local implementation for development and testing.
///
/// A single lock guards the whole keyspace, so every call is atomic just as
/// it would be against a real server.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> R) -> KvResult<R> {
        let data = self.data.read().map_err(|_| KvError::Poisoned)?;
        Ok(f(&data))
    }

    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<String, Value>) -> KvResult<R>) -> KvResult<R> {
        let mut data = self.data.write().map_err(|_| KvError::Poisoned)?;
        f(&mut data)
    }
}

fn wrong_type(key: &str) -> KvError {
    KvError::Unavailable(format!("WRONGTYPE operation against key '{key}'"))
}

impl KeyValue for MemoryStore {
    fn hset(&self, key: &str, fields: &[(&str, String)]) -> KvResult<()> {
        self.write(|data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Value::Hash(HashMap::new()));
            let Value::Hash(hash) = entry else {
                return Err(wrong_type(key));
            };
            for (field, value) in fields {
                hash.insert((*field).to_string(), value.clone());
            }
            Ok(())
        })
    }

    fn hget(&self, key: &str, field: &str) -> KvResult<Option<String>> {
        self.read(|data| match data.get(key) {
            Some(Value::Hash(hash)) => hash.get(field).cloned(),
            _ => None,
        })
    }

    fn hgetall(&self, key: &str) -> KvResult<HashMap<String, String>> {
        self.read(|data| match data.get(key) {
            Some(Value::Hash(hash)) => hash.clone(),
            _ => HashMap::new(),
        })
    }

    fn exists(&self, key: &str) -> KvResult<bool> {
        self.read(|data| data.contains_key(key))
    }

    fn del(&self, key: &str) -> KvResult<bool> {
        self.write(|data| Ok(data.remove(key).is_some()))
    }

    fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        self.write(|data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Value::Set(BTreeSet::new()));
            let Value::Set(set) = entry else {
                return Err(wrong_type(key));
            };
            set.insert(member.to_string());
            Ok(())
        })
    }

    fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        self.write(|data| {
            let now_empty = match data.get_mut(key) {
                Some(Value::Set(set)) => {
                    set.remove(member);
                    set.is_empty()
                }
                Some(_) => return Err(wrong_type(key)),
                None => false,
            };
            // Redis drops empty containers; mirror that so `exists` agrees.
            if now_empty {
                data.remove(key);
            }
            Ok(())
        })
    }

    fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        self.read(|data| match data.get(key) {
            Some(Value::Set(set)) => set.iter().cloned().collect(),
            _ => Vec::new(),
        })
    }

    fn sismember(&self, key: &str, member: &str) -> KvResult<bool> {
        self.read(|data| match data.get(key) {
            Some(Value::Set(set)) => set.contains(member),
            _ => false,
        })
    }

    fn zadd(&self, key: &str, member: &str, score: f64) -> KvResult<()> {
        self.write(|data| {
            let entry = data
                .entry(key.to_string())
                .or_insert_with(|| Value::SortedSet(HashMap::new()));
            let Value::SortedSet(zset) = entry else {
                return Err(wrong_type(key));
            };
            zset.insert(member.to_string(), score);
            Ok(())
        })
    }

    fn zrem(&self, key: &str, member: &str) -> KvResult<()> {
        self.write(|data| {
            let now_empty = match data.get_mut(key) {
                Some(Value::SortedSet(zset)) => {
                    zset.remove(member);
                    zset.is_empty()
                }
                Some(_) => return Err(wrong_type(key)),
                None => false,
            };
            if now_empty {
                data.remove(key);
            }
            Ok(())
        })
    }

    fn zcard(&self, key: &str) -> KvResult<usize> {
        self.read(|data| match data.get(key) {
            Some(Value::SortedSet(zset)) => zset.len(),
            _ => 0,
        })
    }

    fn zscore(&self, key: &str, member: &str) -> KvResult<Option<f64>> {
        self.read(|data| match data.get(key) {
            Some(Value::SortedSet(zset)) => zset.get(member).copied(),
            _ => None,
        })
    }

    fn zrange_withscores(&self, key: &str) -> KvResult<Vec<(String, f64)>> {
        let mut entries = self.read(|data| match data.get(key) {
            Some(Value::SortedSet(zset)) => zset
                .iter()
                .map(|(member, score)| (member.clone(), *score))
                .collect(),
            _ => Vec::new(),
        })?;
        sort_by_score(&mut entries);
        Ok(entries)
    }

    fn scan_prefix(&self, prefix: &str) -> KvResult<Vec<String>> {
        self.read(|data| {
            data.range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, _)| key.clone())
                .collect()
        })
    }
}
