//! In-process shared store.
//!
//! [`MemoryStore`] is the hub holding the entries; each tab gets its own
//! [`MemoryStoreHandle`] with a distinct writer id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{SharedStore, StoreChange, StoreSubscription};
use crate::types::errors::StoreError;

struct Subscriber {
    writer: u64,
    tx: mpsc::UnboundedSender<StoreChange>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String>,
    subscribers: Vec<Subscriber>,
}

impl Inner {
    /// Delivers to every open subscriber except the writer's own, pruning closed ones.
    fn publish(&mut self, writer: u64, change: StoreChange) {
        self.subscribers.retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            if sub.writer != writer {
                let _ = sub.tx.send(change.clone());
            }
            true
        });
    }
}

/// Hub for an in-process shared store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    next_writer: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle for one tab.
    pub fn handle(&self) -> MemoryStoreHandle {
        MemoryStoreHandle {
            inner: self.inner.clone(),
            writer: self.next_writer.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of subscriptions still open.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|sub| !sub.tx.is_closed());
        inner.subscribers.len()
    }
}

/// One tab's view of a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryStoreHandle {
    inner: Arc<Mutex<Inner>>,
    writer: u64,
}

impl SharedStore for MemoryStoreHandle {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let old_value = inner.entries.insert(key.to_string(), value.to_string());
        if old_value.as_deref() == Some(value) {
            return Ok(());
        }
        inner.publish(
            self.writer,
            StoreChange {
                key: key.to_string(),
                old_value,
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.remove(key) {
            inner.publish(
                self.writer,
                StoreChange {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(Subscriber {
            writer: self.writer,
            tx,
        });
        Ok(rx)
    }
}
