//! JVM installation discovery, version parsing, and constraint-based
//! runtime selection.

pub mod discover;
pub mod select;
pub mod version;

pub use discover::{
    discover_installations, is_jdk_home, list_installations_report, probe_version,
    RuntimeInstallation,
};
pub use select::{parse_min_update_version, select_runtime, RuntimeConstraints};
pub use version::RuntimeVersion;

use std::path::PathBuf;

/// An explicit override that bypasses discovery entirely, set via
/// `CAPSULE_JAVA_HOME` or `CAPSULE_JAVA_CMD`.
#[derive(Debug, Clone)]
pub enum RuntimeSelection {
    Override(PathBuf),
    Discovered(RuntimeInstallation),
}
