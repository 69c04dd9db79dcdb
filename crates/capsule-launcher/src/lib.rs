//! The launch pipeline: ties together archive, manifest, cache, runtime,
//! resolve, command, and caplet into one end-to-end `Launcher::run`.

pub mod actions;
pub mod config;
pub mod run;

pub use config::{ExitCode, LauncherConfig, LogLevel};
pub use run::Launcher;
