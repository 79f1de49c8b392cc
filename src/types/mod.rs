// tabsync shared type definitions
// Each submodule defines types used across the crate.

pub mod errors;
pub mod playback;
pub mod presence;
pub mod settings;
