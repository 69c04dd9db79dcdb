use std::path::{Path, PathBuf};

use capsule_util::errors::CapsuleError;

/// Inputs available when expanding `$CAPSULE_DIR`/`$CAPSULE_JAR`/`$JAVA_HOME`
/// references inside attribute values.
pub struct ExpansionContext<'a> {
    pub archive_path: &'a Path,
    pub app_cache_dir: Option<&'a Path>,
    pub java_home: &'a Path,
}

/// Textually replace `$CAPSULE_DIR`, `$CAPSULE_JAR`, `$JAVA_HOME` in
/// `value`. Applied to list/map **values** only, never to keys.
pub fn expand_vars(value: &str, ctx: &ExpansionContext<'_>) -> Result<String, CapsuleError> {
    let mut out = value.to_string();

    if out.contains("$CAPSULE_DIR") {
        let dir = ctx.app_cache_dir.ok_or_else(|| CapsuleError::AttributeMisuse {
            message: format!("'{value}' references $CAPSULE_DIR but the capsule was not extracted"),
        })?;
        out = out.replace("$CAPSULE_DIR", &dir.to_string_lossy());
    }
    out = out.replace("$CAPSULE_JAR", &ctx.archive_path.to_string_lossy());
    out = out.replace("$JAVA_HOME", &ctx.java_home.to_string_lossy());

    Ok(out)
}

/// Reject an archive-relative attribute value (`App-Class-Path`, `Script`,
/// etc.) that would escape the archive root via an absolute path or `..`.
pub fn sanitize_archive_relative(s: &str) -> Result<&str, CapsuleError> {
    if capsule_util::fs::normalized_is_safe(s) {
        Ok(s)
    } else {
        Err(CapsuleError::AttributeMisuse {
            message: format!("'{s}' is not a safe archive-relative path"),
        })
    }
}

/// Deduplicate a list of paths by canonicalized form, keeping the first
/// occurrence (falls back to the path itself when canonicalization fails,
/// e.g. for a path that doesn't exist yet).
pub fn dedup_paths_keep_first(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            out.push(path);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_capsule_jar_and_java_home() {
        let ctx = ExpansionContext {
            archive_path: Path::new("/app/my.capsule"),
            app_cache_dir: None,
            java_home: Path::new("/opt/jdk-17"),
        };
        let out = expand_vars("$JAVA_HOME/bin/java -jar $CAPSULE_JAR", &ctx).unwrap();
        assert_eq!(out, "/opt/jdk-17/bin/java -jar /app/my.capsule");
    }

    #[test]
    fn capsule_dir_without_extraction_is_an_error() {
        let ctx = ExpansionContext {
            archive_path: Path::new("/app/my.capsule"),
            app_cache_dir: None,
            java_home: Path::new("/opt/jdk-17"),
        };
        assert!(expand_vars("$CAPSULE_DIR/lib", &ctx).is_err());
    }

    #[test]
    fn sanitize_rejects_escape() {
        assert!(sanitize_archive_relative("../etc/passwd").is_err());
        assert!(sanitize_archive_relative("lib/a.jar").is_ok());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let paths = vec![PathBuf::from("/nonexistent/a.jar"), PathBuf::from("/nonexistent/a.jar")];
        let deduped = dedup_paths_keep_first(paths);
        assert_eq!(deduped.len(), 1);
    }
}
