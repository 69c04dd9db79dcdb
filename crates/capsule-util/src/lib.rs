//! Shared utilities for the Capsule launcher.
//!
//! This crate provides cross-cutting concerns used by all other Capsule
//! crates: error types, filesystem helpers, cryptographic hashing, process
//! spawning/supervision, and terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;

use std::path::{Path, PathBuf};

/// The platform-specific classpath entry separator (`:` on Unix, `;` on Windows).
pub fn classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

/// Join a list of paths into a single classpath string.
pub fn join_classpath(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(classpath_separator())
}

/// Resolve the user's home directory, checking `HOME` then `USERPROFILE`.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .map(PathBuf::from)
}

/// The platform-appropriate local-data directory used to anchor per-user
/// caches when no explicit override is given.
///
/// Unix-like: `$HOME`. Windows: `%LOCALAPPDATA%`, falling back to
/// `%APPDATA%`, then `%USERPROFILE%\AppData\Local`.
pub fn user_local_dir() -> PathBuf {
    if cfg!(windows) {
        if let Ok(v) = std::env::var("LOCALAPPDATA") {
            return PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("APPDATA") {
            return PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("USERPROFILE") {
            return Path::new(&v).join("AppData").join("Local");
        }
        PathBuf::from(".")
    } else {
        home_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}
