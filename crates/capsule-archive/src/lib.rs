//! ZIP-family archive reading and extraction for Capsule containers.
//!
//! A Capsule is an ordinary ZIP file (most often produced as a "fat JAR")
//! with an executable stub prepended; the `zip` crate happily opens such
//! files because it scans for the end-of-central-directory record from the
//! end of the file rather than assuming the archive starts at offset 0.

use std::fs::File;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use capsule_util::errors::CapsuleError;
use capsule_util::fs::safe_join;

/// An opened archive, backed by a read-only file handle.
pub struct Archive {
    path: PathBuf,
    inner: zip::ZipArchive<File>,
}

impl Archive {
    /// Open `path` as a ZIP-family archive.
    pub fn open(path: &Path) -> Result<Self, CapsuleError> {
        let file = File::open(path)?;
        let inner = zip::ZipArchive::new(file).map_err(|e| CapsuleError::InvalidArchive {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// The path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate over entry names in central-directory order.
    pub fn entry_names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.inner.len()).filter_map(|i| self.inner.name_for_index(i).map(str::to_string))
    }

    /// Read the contents of `name` into a byte buffer.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, CapsuleError> {
        let mut entry =
            self.inner
                .by_name(name)
                .map_err(|e| CapsuleError::InvalidArchive {
                    message: format!("no such entry '{name}': {e}"),
                })?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Read the contents of `name` as a UTF-8 string.
    pub fn read_to_string(&mut self, name: &str) -> Result<String, CapsuleError> {
        let bytes = self.read(name)?;
        String::from_utf8(bytes).map_err(|e| CapsuleError::InvalidArchive {
            message: format!("entry '{name}' is not valid UTF-8: {e}"),
        })
    }

    /// The archive file's own modification time, used as the cache staleness
    /// signal (re-extract if the archive on disk is newer than the cache's
    /// `.extracted` marker).
    pub fn modified_time(&self) -> Result<SystemTime, CapsuleError> {
        Ok(self.path.metadata()?.modified()?)
    }

    /// Extract every entry for which `filter` returns true into `dest`.
    ///
    /// Rejects any entry whose path would escape `dest` via `..` or an
    /// absolute path. Preserves the Unix executable bit where the archive
    /// recorded one. Each file is written atomically (temp file + rename).
    pub fn extract_to(
        &mut self,
        dest: &Path,
        filter: impl Fn(&str) -> bool,
    ) -> Result<(), CapsuleError> {
        capsule_util::fs::ensure_dir(dest)?;

        for i in 0..self.inner.len() {
            let mut entry = self.inner.by_index(i).map_err(|e| CapsuleError::InvalidArchive {
                message: format!("zip entry error: {e}"),
            })?;
            let name = entry.name().to_string();
            if !filter(&name) {
                continue;
            }

            let out_path = safe_join(dest, &name)?;

            if entry.is_dir() {
                capsule_util::fs::ensure_dir(&out_path)?;
                continue;
            }

            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf)?;
            capsule_util::fs::write_atomic(&out_path, &buf)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    if let Err(e) =
                        std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                    {
                        tracing::warn!(
                            "failed to set permissions on {}: {e}",
                            out_path.display()
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// True for entries that look like JAR signature metadata
/// (`META-INF/*.SF`, `*.RSA`, `*.DSA`), which Capsule never extracts or
/// otherwise treats as ordinary content.
pub fn is_signature_entry(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    upper.starts_with("META-INF/")
        && (upper.ends_with(".SF") || upper.ends_with(".RSA") || upper.ends_with(".DSA"))
}
