//! The keyspace.
//!
//! [`KeyValueStore`] owns every key and is shared behind a single
//! `tokio::sync::Mutex`; handlers call its typed operations and never hold
//! references to list nodes or stream entries across await points.
//!
//! Expiry is lazy: any operation that touches a key first checks its
//! deadline and removes the key when the deadline has passed. A list that
//! becomes empty is removed from the keyspace, so an empty list and a
//! missing key are indistinguishable.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::time::Instant;

use crate::stream::{EntryFields, IdSpec, Stream, StreamError, StreamId};

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR {0}")]
    Stream(#[from] StreamError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(String),
    List(VecDeque<String>),
    Stream(Stream),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    pub expiration: Option<Instant>,
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: HashMap<String, Value>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        KeyValueStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Direct insert, used by tests to seed the keyspace.
    pub fn insert_value(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Drops the key if its deadline has passed. Every operation calls this
    /// before touching the key.
    fn evict_expired(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(Instant::now()));

        if expired {
            self.entries.remove(key);
        }
    }

    /// Creates or overwrites a string key, replacing any previous variant.
    pub fn set(&mut self, key: String, value: String, expiration: Option<Instant>) {
        self.entries.insert(
            key,
            Value {
                data: DataType::String(value),
                expiration,
            },
        );
    }

    pub fn get(&mut self, key: &str) -> Result<Option<&str>, StoreError> {
        self.evict_expired(key);

        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => match &value.data {
                DataType::String(content) => Ok(Some(content.as_str())),
                _ => Err(StoreError::WrongType),
            },
        }
    }

    /// Increments the signed 64-bit integer stored at `key`. A missing key
    /// is initialized to 0 before the increment. The TTL of an existing key
    /// is left untouched.
    pub fn incr(&mut self, key: &str) -> Result<i64, StoreError> {
        self.evict_expired(key);

        let value = self.entries.entry(key.to_string()).or_insert_with(|| Value {
            data: DataType::String("0".to_string()),
            expiration: None,
        });

        let DataType::String(ref mut content) = value.data else {
            return Err(StoreError::WrongType);
        };

        let current = content
            .parse::<i64>()
            .map_err(|_| StoreError::NotAnInteger)?;
        let incremented = current.checked_add(1).ok_or(StoreError::NotAnInteger)?;

        *content = incremented.to_string();

        Ok(incremented)
    }

    pub fn value_type(&mut self, key: &str) -> &'static str {
        self.evict_expired(key);

        match self.entries.get(key) {
            None => "none",
            Some(value) => match value.data {
                DataType::String(_) => "string",
                DataType::List(_) => "list",
                DataType::Stream(_) => "stream",
            },
        }
    }

    /// Pushes values onto a list, creating it if absent. With `prepend` each
    /// value is prepended individually, so `LPUSH k a b c` leaves `c` at the
    /// head. Returns the new length.
    pub fn push(
        &mut self,
        key: &str,
        values: &[String],
        prepend: bool,
    ) -> Result<usize, StoreError> {
        self.evict_expired(key);

        let value = self.entries.entry(key.to_string()).or_insert_with(|| Value {
            data: DataType::List(VecDeque::new()),
            expiration: None,
        });

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        for value in values {
            if prepend {
                list.push_front(value.clone());
            } else {
                list.push_back(value.clone());
            }
        }

        Ok(list.len())
    }

    /// Removes and returns the head element. Removes the key once the list
    /// is emptied.
    pub fn pop_front(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        self.evict_expired(key);

        let Some(value) = self.entries.get_mut(key) else {
            return Ok(None);
        };

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let popped = list.pop_front();
        let now_empty = list.is_empty();

        if now_empty {
            self.entries.remove(key);
        }

        Ok(popped)
    }

    /// Removes and returns up to `count` head elements.
    pub fn pop_front_count(&mut self, key: &str, count: usize) -> Result<Vec<String>, StoreError> {
        self.evict_expired(key);

        let Some(value) = self.entries.get_mut(key) else {
            return Ok(Vec::new());
        };

        let DataType::List(ref mut list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let take = count.min(list.len());
        let popped: Vec<String> = list.drain(..take).collect();
        let now_empty = list.is_empty();

        if now_empty {
            self.entries.remove(key);
        }

        Ok(popped)
    }

    pub fn list_len(&mut self, key: &str) -> Result<usize, StoreError> {
        self.evict_expired(key);

        match self.entries.get(key) {
            None => Ok(0),
            Some(value) => match &value.data {
                DataType::List(list) => Ok(list.len()),
                _ => Err(StoreError::WrongType),
            },
        }
    }

    /// Inclusive range with negative indices counted from the tail. Indices
    /// are clamped to the list; a reversed range yields nothing.
    pub fn list_range(
        &mut self,
        key: &str,
        start_index: i64,
        end_index: i64,
    ) -> Result<Vec<String>, StoreError> {
        self.evict_expired(key);

        let Some(value) = self.entries.get(key) else {
            return Ok(Vec::new());
        };

        let DataType::List(ref list) = value.data else {
            return Err(StoreError::WrongType);
        };

        let Some((start, end)) = resolve_range_indexes(list.len(), start_index, end_index) else {
            return Ok(Vec::new());
        };

        Ok(list.range(start..=end).cloned().collect())
    }

    /// Appends an entry to the stream at `key`, creating the stream if the
    /// key is absent. A rejected ID on a fresh key leaves the keyspace
    /// unchanged.
    pub fn stream_add(
        &mut self,
        key: &str,
        spec: IdSpec,
        now_ms: u64,
        fields: EntryFields,
    ) -> Result<StreamId, StoreError> {
        self.evict_expired(key);

        if let Some(value) = self.entries.get_mut(key) {
            let DataType::Stream(ref mut stream) = value.data else {
                return Err(StoreError::WrongType);
            };
            return Ok(stream.add(spec, now_ms, fields)?);
        }

        let mut stream = Stream::new();
        let id = stream.add(spec, now_ms, fields)?;

        self.entries.insert(
            key.to_string(),
            Value {
                data: DataType::Stream(stream),
                expiration: None,
            },
        );

        Ok(id)
    }

    pub fn stream(&mut self, key: &str) -> Result<Option<&Stream>, StoreError> {
        self.evict_expired(key);

        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => match &value.data {
                DataType::Stream(stream) => Ok(Some(stream)),
                _ => Err(StoreError::WrongType),
            },
        }
    }

    /// The cached maximum ID of the stream at `key`; `0-0` when the key is
    /// absent. Used to resolve `$` at XREAD subscribe time.
    pub fn last_stream_id(&mut self, key: &str) -> Result<StreamId, StoreError> {
        Ok(self
            .stream(key)?
            .map(Stream::last_id)
            .unwrap_or(StreamId::ZERO))
    }
}

fn resolve_range_indexes(length: usize, start_index: i64, end_index: i64) -> Option<(usize, usize)> {
    let length = length as i64;

    let mut start = if start_index < 0 {
        length + start_index
    } else {
        start_index
    };
    let mut end = if end_index < 0 {
        length + end_index
    } else {
        end_index
    };

    start = start.max(0);
    end = end.min(length - 1);

    if start >= length || start > end {
        return None;
    }

    Some((start as usize, end as usize))
}
