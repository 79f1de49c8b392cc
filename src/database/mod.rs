//! tabsync database layer.
//!
//! Provides SQLite connection management and schema migrations for the
//! cross-process shared store.
//!
//! # Usage
//!
//! ```no_run
//! use tabsync::database::Database;
//!
//! // Open the store file shared by every tab process
//! let db = Database::open("tabsync.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Access the underlying connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
