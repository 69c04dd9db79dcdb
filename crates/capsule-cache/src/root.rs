use std::path::PathBuf;

use capsule_util::errors::CapsuleError;

/// The resolved location of the Capsule cache, either a durable
/// user-local directory or (when that can't be created) a volatile
/// temp directory that is removed on process exit.
pub enum CacheRoot {
    Durable(PathBuf),
    Volatile(tempfile::TempDir),
}

impl CacheRoot {
    /// `$CAPSULE_CACHE_DIR` if set, else `<user-local>/<$CAPSULE_CACHE_NAME
    /// or "capsule">`.
    pub fn resolve() -> PathBuf {
        if let Ok(dir) = std::env::var("CAPSULE_CACHE_DIR") {
            return PathBuf::from(dir);
        }
        let name = std::env::var("CAPSULE_CACHE_NAME").unwrap_or_else(|_| "capsule".to_string());
        capsule_util::user_local_dir().join(name)
    }

    /// Create `<root>/apps/` and `<root>/deps/` if absent, returning the
    /// root path.
    pub fn ensure() -> Result<PathBuf, CapsuleError> {
        let root = Self::resolve();
        capsule_util::fs::ensure_dir(&root.join("apps"))?;
        capsule_util::fs::ensure_dir(&root.join("deps"))?;
        Ok(root)
    }

    /// Like [`CacheRoot::ensure`], but falls back to a temp-directory-backed
    /// root (logging a warning) if the durable root can't be created —
    /// read-only filesystem, permission failure, etc.
    pub fn resolve_or_temp() -> Result<Self, CapsuleError> {
        match Self::ensure() {
            Ok(root) => Ok(CacheRoot::Durable(root)),
            Err(e) => {
                tracing::warn!("cache root unavailable ({e}), falling back to a temp directory");
                let dir = tempfile::tempdir()?;
                capsule_util::fs::ensure_dir(&dir.path().join("apps"))?;
                capsule_util::fs::ensure_dir(&dir.path().join("deps"))?;
                Ok(CacheRoot::Volatile(dir))
            }
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            CacheRoot::Durable(p) => p,
            CacheRoot::Volatile(t) => t.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_honors_cache_dir_override() {
        std::env::set_var("CAPSULE_CACHE_DIR", "/tmp/capsule-test-override");
        assert_eq!(CacheRoot::resolve(), PathBuf::from("/tmp/capsule-test-override"));
        std::env::remove_var("CAPSULE_CACHE_DIR");
    }
}
