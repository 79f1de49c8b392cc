//! Shared key-value store seen by every tab.
//!
//! The store is a last-write-wins register map with no locking and no
//! compare-and-swap. Each handle is scoped to one tab: a handle's own writes
//! are never delivered back to its subscribers, matching how a browser's
//! `storage` event skips the writing tab.

pub mod memory;
pub mod sqlite;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::types::errors::StoreError;

pub use memory::{MemoryStore, MemoryStoreHandle};
pub use sqlite::SqliteStore;

/// A write or removal made by another tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the entry was removed.
    pub new_value: Option<String>,
}

/// Receiver side of a store subscription. Dropping it unsubscribes.
pub type StoreSubscription = mpsc::UnboundedReceiver<StoreChange>;

/// Tab-scoped access to the shared store.
pub trait SharedStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Full scan of every entry, in no particular order.
    fn entries(&self) -> Result<Vec<(String, String)>, StoreError>;
    /// Starts delivering changes made through other handles.
    fn subscribe(&self) -> Result<StoreSubscription, StoreError>;
}
