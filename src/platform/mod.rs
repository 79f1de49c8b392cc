// tabsync platform abstraction
// Resolves where settings and the shared store file live on each OS.
//
// Uses `cfg(target_os)` to pick the implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Application directory name used under every platform root.
pub const APP_DIR: &str = "tabsync";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/tabsync` or `~/.config/tabsync`
/// - **macOS**: `~/Library/Application Support/tabsync`
/// - **Windows**: `%APPDATA%/tabsync`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory, home of the shared store file.
///
/// - **Linux**: `$XDG_DATA_HOME/tabsync` or `~/.local/share/tabsync`
/// - **macOS**: `~/Library/Application Support/tabsync`
/// - **Windows**: `%APPDATA%/tabsync`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
