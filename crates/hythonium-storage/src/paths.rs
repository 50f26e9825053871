//! Resource locations
//!
//! Resources live beside the running executable rather than in the current
//! working directory, so the shell behaves the same wherever it is launched
//! from.

use std::path::PathBuf;

/// Directory containing the running executable.
///
/// Falls back to the current directory when the executable path cannot be
/// determined (some sandboxed or exotic platforms).
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Path of a named resource beside the executable.
pub fn resource_path(name: &str) -> PathBuf {
    exe_dir().join(name)
}
