//! tabsync: keeps video pause/resume state consistent across tabs of the same site.
//!
//! Each tab publishes a heartbeat to a shared key-value store. While two or
//! more tabs are live, a local pause or resume is written to a global flag
//! and every other tab brings its video in line with it.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod clock;
pub mod database;
pub mod managers;
pub mod platform;
pub mod player;
pub mod rpc_handler;
pub mod services;
pub mod session;
pub mod store;
pub mod types;
