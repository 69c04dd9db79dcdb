use std::path::{Path, PathBuf};

use capsule_archive::Archive;
use capsule_manifest::{Manifest, ResolutionContext};
use capsule_util::errors::CapsuleError;
use fs2::FileExt;

/// Class-file glob prefix the historical Java implementation used for its
/// own launcher classes, preserved here only to exclude them from
/// extraction output (a Rust launcher has no class files of its own, but
/// an archive built for the original Capsule tool may still carry them).
const CAPSULE_LAUNCHER_PREFIX: &str = "Capsule";
const LAUNCHER_SUPPORT_PREFIX: &str = "capsule/";

/// Inputs to an extraction decision: the archive being launched, its
/// resolution context, and whether the caller explicitly requested reset.
pub struct CacheContext<'a> {
    pub archive: &'a mut Archive,
    pub manifest: &'a Manifest,
    pub ctx: &'a ResolutionContext,
    pub reset: bool,
}

/// Manages the on-disk extraction of one capsule's resources under the
/// cache root's `apps/` directory.
pub struct AppCache;

impl AppCache {
    /// Derive a filesystem-safe application ID: explicit `Application-ID`,
    /// else `group.artifact_version` of the `Application` coordinate, else
    /// `Application-Class` with dots replaced by underscores.
    pub fn id_for(manifest: &Manifest, ctx: &ResolutionContext) -> Result<String, CapsuleError> {
        let id = if let Some(id) = manifest.get("Application-ID", ctx) {
            id
        } else if let Some(app) = manifest.get("Application", ctx) {
            let coord = capsule_manifest::Coordinate::parse(&app).ok_or_else(|| {
                CapsuleError::InvalidManifest {
                    message: format!("Application coordinate '{app}' could not be parsed"),
                }
            })?;
            let version = match coord.version {
                Some(capsule_manifest::VersionSpec::Exact(v)) => format!("_{v}"),
                _ => String::new(),
            };
            format!("{}.{}{}", coord.group, coord.artifact, version)
        } else if let Some(class) = manifest.get("Application-Class", ctx) {
            class.replace('.', "_")
        } else {
            return Err(CapsuleError::MissingEntrypoint {
                message: "manifest has neither Application-ID, Application, nor Application-Class"
                    .to_string(),
            });
        };

        if id.contains('/') || id.contains('\\') {
            return Err(CapsuleError::InvalidManifest {
                message: format!("derived application id '{id}' contains path separators"),
            });
        }
        Ok(id)
    }

    /// `apps/<id>` or `apps/<id>_<version>`.
    pub fn dir_for(root: &Path, id: &str, version: Option<&str>) -> PathBuf {
        let name = match version {
            Some(v) => format!("{id}_{v}"),
            None => id.to_string(),
        };
        root.join("apps").join(name)
    }

    /// Whether this capsule needs a persistent extraction directory at
    /// all: a startup script is declared, a declared native dependency
    /// carries a rename, or (the default case) `Extract` is absent/true
    /// and `Application-Artifact` is absent.
    pub fn needs_extraction(manifest: &Manifest, ctx: &ResolutionContext) -> bool {
        if manifest.has("Script", ctx) {
            return true;
        }
        if Self::has_renamed_native_dependency(manifest, ctx) {
            return true;
        }
        let extract_enabled = manifest.get("Extract", ctx).as_deref() != Some("false");
        extract_enabled && !manifest.has("Application-Artifact", ctx)
    }

    fn has_renamed_native_dependency(manifest: &Manifest, ctx: &ResolutionContext) -> bool {
        let native_attr = match ctx.os {
            capsule_manifest::OsName::Linux | capsule_manifest::OsName::Posix => {
                "Native-Dependencies-Linux"
            }
            capsule_manifest::OsName::Mac => "Native-Dependencies-Mac",
            capsule_manifest::OsName::Windows => "Native-Dependencies-Win",
        };
        manifest
            .get_list(native_attr, ctx)
            .iter()
            .any(|token| token.contains('=') || token.contains(','))
    }

    /// Decide whether extraction is needed, and if so, perform it under an
    /// exclusive cross-process lock with double-checked staleness.
    /// Returns `Ok(None)` when extraction was not needed.
    pub fn prepare(
        root: &Path,
        id: &str,
        version: Option<&str>,
        cx: &mut CacheContext<'_>,
    ) -> Result<Option<PathBuf>, CapsuleError> {
        if !cx.reset && !Self::needs_extraction(cx.manifest, cx.ctx) {
            return Ok(None);
        }

        let apps_dir = root.join("apps");
        capsule_util::fs::ensure_dir(&apps_dir)?;
        let dest = Self::dir_for(root, id, version);
        let lock_path = apps_dir.join(format!("{id}.lock"));
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock_file
            .lock_exclusive()
            .map_err(|e| CapsuleError::CacheIoFailure {
                message: format!("failed to lock {}: {e}", lock_path.display()),
            })?;

        let result = (|| -> Result<Option<PathBuf>, CapsuleError> {
            let marker = dest.join(".extracted");
            let archive_mtime = cx.archive.modified_time()?;

            if !cx.reset {
                if let Ok(marker_meta) = marker.metadata() {
                    if let Ok(marker_mtime) = marker_meta.modified() {
                        if marker_mtime >= archive_mtime {
                            // Up to date: a concurrent writer may have just
                            // finished this extraction.
                            return Ok(Some(dest));
                        }
                    }
                }
            }

            capsule_util::progress::status("Extracting", &format!("{id} to {}", dest.display()));
            capsule_util::fs::clear_dir_contents(&dest)?;
            cx.archive.extract_to(&dest, |name| {
                Self::should_extract(name)
            })?;
            capsule_util::fs::write_atomic(&marker, b"")?;
            Ok(Some(dest))
        })();

        let _ = lock_file.unlock();
        result
    }

    fn should_extract(name: &str) -> bool {
        if name.starts_with("META-INF/") {
            return false;
        }
        if name.starts_with(LAUNCHER_SUPPORT_PREFIX) {
            return false;
        }
        if name.starts_with(CAPSULE_LAUNCHER_PREFIX) && name.ends_with(".class") {
            return false;
        }
        if capsule_archive::is_signature_entry(name) {
            return false;
        }
        true
    }

    /// Delete a previously-extracted application directory, for
    /// `capsule.reset`.
    pub fn reset(root: &Path, id: &str) -> Result<(), CapsuleError> {
        let dest = Self::dir_for(root, id, None);
        if dest.is_dir() {
            std::fs::remove_dir_all(&dest)?;
        }
        Ok(())
    }
}
