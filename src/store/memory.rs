//! In-process key-value store and a call-tracing wrapper.

use super::{KeyValueStore, StoreResult};
use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Key-value store held in memory, selected by `memory://` URLs.
#[derive(Debug, Default)]
pub struct MemoryKv {
    data: Mutex<HashMap<String, String>>,
    closed: AtomicBool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryKv {
    fn ping(&self) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(true)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.ensure_open()?;
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.ensure_open()?;
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Wraps a store and logs every command with its arguments and result.
#[derive(Debug)]
pub struct LoggedKv<S> {
    inner: S,
    name: String,
}

impl<S: KeyValueStore> LoggedKv<S> {
    pub fn new(inner: S, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: KeyValueStore> KeyValueStore for LoggedKv<S> {
    fn ping(&self) -> StoreResult<bool> {
        debug!(logger = %self.name, "Calling kv command: ping");
        let result = self.inner.ping();
        debug!(logger = %self.name, result = ?result, "Result of ping");
        result
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        debug!(logger = %self.name, key = %key, "Calling kv command: get");
        let result = self.inner.get(key);
        debug!(logger = %self.name, result = ?result, "Result of get");
        result
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        debug!(logger = %self.name, key = %key, value = %value, "Calling kv command: set");
        let result = self.inner.set(key, value);
        debug!(logger = %self.name, result = ?result, "Result of set");
        result
    }

    fn close(&self) -> StoreResult<()> {
        debug!(logger = %self.name, "Calling kv command: close");
        self.inner.close()
    }
}
