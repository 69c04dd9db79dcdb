use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Global user configuration loaded from `~/.capsule/config.toml`.
///
/// Carries only cross-invocation defaults that have no archive-level
/// equivalent; absent entirely is a valid, empty default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default, rename = "default-log-level")]
    pub default_log_level: Option<String>,

    #[serde(default, rename = "repos")]
    pub repos: Vec<String>,

    #[serde(default, rename = "trust-unknown-caplets")]
    pub trust_unknown_caplets: bool,
}

impl GlobalConfig {
    /// Load `~/.capsule/config.toml`, or return defaults if the file is
    /// absent.
    pub fn load() -> miette::Result<Self> {
        let path = Self::default_path();
        if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                capsule_util::errors::CapsuleError::Generic {
                    message: format!("failed to read global config: {e}"),
                }
            })?;
            toml::from_str(&content).map_err(|e| {
                capsule_util::errors::CapsuleError::Generic {
                    message: format!("failed to parse global config: {e}"),
                }
                .into()
            })
        } else {
            Ok(Self::default())
        }
    }

    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }
}

/// `~/.capsule/`.
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".capsule")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let config = GlobalConfig::default();
        assert!(config.default_log_level.is_none());
        assert!(config.repos.is_empty());
        assert!(!config.trust_unknown_caplets);
    }

    #[test]
    fn dirs_path_is_dot_capsule() {
        assert!(dirs_path().ends_with(".capsule"));
    }
}
