use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;

const SUFFIX_LEN: usize = 9;

/// Opaque identity of one tab instance, fixed for the lifetime of the tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(String);

impl TabId {
    /// Generates `<unix-millis>_<random suffix>`.
    pub fn generate(clock: &dyn Clock) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("{}_{}", clock.now_millis(), &random[..SUFFIX_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TabId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A heartbeat entry read back from the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatEntry {
    /// Full store key, prefix included.
    pub key: String,
    pub tab_id: TabId,
    /// Unix milliseconds of the owner's last refresh.
    pub last_seen: i64,
}

impl HeartbeatEntry {
    /// Parses a raw store entry. Returns `None` when the key lacks the prefix
    /// or the value is not an integer timestamp.
    pub fn parse(prefix: &str, key: &str, value: &str) -> Option<Self> {
        let tab_id = key.strip_prefix(prefix)?;
        let last_seen = value.trim().parse::<i64>().ok()?;
        Some(Self {
            key: key.to_string(),
            tab_id: TabId::from(tab_id),
            last_seen,
        })
    }

    /// Live iff strictly younger than `window_ms` at `now`.
    pub fn is_live_at(&self, now: i64, window_ms: i64) -> bool {
        now.saturating_sub(self.last_seen) < window_ms
    }
}
