use thiserror::Error;

// === StoreError ===

/// Errors raised by a shared store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database rejected an operation.
    #[error("Store database error: {0}")]
    DatabaseError(String),
    /// The change poller could not be started.
    #[error("Store subscription failed: {0}")]
    SubscriptionFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === SessionError ===

/// Errors raised while starting a tab session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The page URL matches none of the configured patterns.
    #[error("Page is not a sync target: {0}")]
    InactivePage(String),
    /// No Tokio runtime is available to drive the session loop.
    #[error("No async runtime available to run the session")]
    NoRuntime,
    /// The settings failed validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The shared store could not be subscribed to.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Returns true if the session was refused because the page is out of scope,
    /// which callers treat as a normal, silent outcome.
    pub fn is_inactive_page(&self) -> bool {
        matches!(self, SessionError::InactivePage(_))
    }
}
