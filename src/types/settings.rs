use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::SettingsError;

/// Top-level sync settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub keys: KeySettings,
    pub timing: TimingSettings,
    pub activation: ActivationSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            keys: KeySettings::default(),
            timing: TimingSettings::default(),
            activation: ActivationSettings::default(),
        }
    }
}

impl SyncSettings {
    /// Checks the settings are usable by a tab session.
    ///
    /// The liveness window must be strictly longer than the refresh interval,
    /// otherwise a healthy tab can be judged dead between two refreshes.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.keys.heartbeat_prefix.is_empty() {
            return Err(SettingsError::InvalidValue(
                "keys.heartbeat_prefix cannot be empty".to_string(),
            ));
        }
        if self.keys.pause_key.is_empty() {
            return Err(SettingsError::InvalidValue(
                "keys.pause_key cannot be empty".to_string(),
            ));
        }
        if self.keys.pause_key.starts_with(&self.keys.heartbeat_prefix) {
            return Err(SettingsError::InvalidValue(
                "keys.pause_key cannot share the heartbeat prefix".to_string(),
            ));
        }
        let t = &self.timing;
        if t.refresh_interval_ms == 0 || t.liveness_window_ms == 0 || t.store_poll_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "timing values must be greater than zero".to_string(),
            ));
        }
        if t.liveness_window_ms <= t.refresh_interval_ms {
            return Err(SettingsError::InvalidValue(format!(
                "liveness window ({} ms) must exceed refresh interval ({} ms)",
                t.liveness_window_ms, t.refresh_interval_ms
            )));
        }
        Ok(())
    }

    /// Returns true if the page URL matches one of the activation patterns.
    pub fn matches_url(&self, url: &str) -> bool {
        self.activation
            .url_patterns
            .iter()
            .any(|pattern| glob_match(pattern, url))
    }
}

/// Store key layout shared by every tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeySettings {
    pub heartbeat_prefix: String,
    pub pause_key: String,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            heartbeat_prefix: "yt_tab_".to_string(),
            pause_key: "yt_global_paused".to_string(),
        }
    }
}

/// Liveness and cadence policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingSettings {
    pub liveness_window_ms: u64,
    pub refresh_interval_ms: u64,
    /// How often the SQLite store polls its change log.
    pub store_poll_interval_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            liveness_window_ms: 5000,
            refresh_interval_ms: 2000,
            store_poll_interval_ms: 100,
        }
    }
}

impl TimingSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn store_poll_interval(&self) -> Duration {
        Duration::from_millis(self.store_poll_interval_ms)
    }

    pub fn liveness_window_millis(&self) -> i64 {
        i64::try_from(self.liveness_window_ms).unwrap_or(i64::MAX)
    }
}

/// Which pages a session runs on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivationSettings {
    pub url_patterns: Vec<String>,
}

impl Default for ActivationSettings {
    fn default() -> Self {
        Self {
            url_patterns: vec!["https://www.youtube.com/*".to_string()],
        }
    }
}

/// Userscript-style match: `*` matches any run of characters, everything else is literal.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while ti < t.len() {
        if pi < p.len() && p[pi] != '*' && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
