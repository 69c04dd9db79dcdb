use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use regex::Regex;

use crate::version::RuntimeVersion;

/// A discovered JVM installation.
#[derive(Debug, Clone)]
pub struct RuntimeInstallation {
    pub version: RuntimeVersion,
    pub home: PathBuf,
    pub is_jdk: bool,
}

pub fn java_bin(home: &Path) -> PathBuf {
    if cfg!(windows) {
        home.join("bin").join("java.exe")
    } else {
        home.join("bin").join("java")
    }
}

pub fn is_jdk_home(home: &Path) -> bool {
    let javac = if cfg!(windows) {
        home.join("bin").join("javac.exe")
    } else {
        home.join("bin").join("javac")
    };
    javac.exists()
}

/// Walk upward from `start`, looking for sibling runtime installations.
/// The first ancestor directory with at least one matching candidate wins;
/// no further ancestors are examined.
pub fn discover_installations(start: &Path) -> Vec<RuntimeInstallation> {
    let name_pattern = Regex::new(r"(?i)^(jdk|jre)?[0-9][^/]*$").expect("valid regex");

    let mut current = Some(start);
    while let Some(dir) = current {
        let mut found = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                let looks_like_runtime = name_pattern.is_match(&name)
                    || name.ends_with(".jdk")
                    || name.ends_with(".jre");
                if !looks_like_runtime {
                    continue;
                }

                // macOS bundles nest the real home under Contents/Home.
                let candidate_home = if path.join("Contents/Home").join("bin").join("java").exists() {
                    path.join("Contents/Home")
                } else {
                    path.clone()
                };

                if !java_bin(&candidate_home).exists() {
                    continue;
                }

                let version = RuntimeVersion::parse(&name).filter(|v| v.minor > 0 || v.patch > 0 || v.major > 0);
                let version = match version {
                    Some(v) if name.chars().next().is_some_and(|c| c.is_ascii_digit()) => v,
                    _ => match probe_version(&candidate_home) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::debug!(
                                "skipping candidate runtime at {}: {e}",
                                candidate_home.display()
                            );
                            continue;
                        }
                    },
                };

                found.push(RuntimeInstallation {
                    version,
                    is_jdk: is_jdk_home(&candidate_home),
                    home: candidate_home,
                });
            }
        }

        if !found.is_empty() {
            return found;
        }

        current = dir.parent();
    }

    Vec::new()
}

/// Spawn `<home>/bin/java -version` with a bounded timeout and parse the
/// first quoted-string line of stderr into a full version quad.
///
/// Grounded in `kargo-toolchain`'s `parse_java_version`, generalized to
/// recover `(major, minor, patch, update)` rather than only the major
/// component.
pub fn probe_version(home: &Path) -> Result<RuntimeVersion, String> {
    let java = java_bin(home);
    let mut child = Command::new(&java)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {e}", java.display()))?;

    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(3);
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    return Err(format!("{} -version timed out", java.display()));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => return Err(format!("error waiting for {}: {e}", java.display())),
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("failed to collect output: {e}"))?;
    let stderr = String::from_utf8_lossy(&output.stderr);

    for line in stderr.lines() {
        if let Some(start) = line.find('"') {
            if let Some(end) = line[start + 1..].find('"') {
                let quoted = &line[start + 1..start + 1 + end];
                if let Some(version) = RuntimeVersion::parse(quoted) {
                    return Ok(version);
                }
            }
        }
    }

    Err(format!("could not parse version from: {stderr}"))
}

/// A human-readable, one-line-per-installation report used by the
/// `capsule.jvms` action handler.
pub fn list_installations_report(installations: &[RuntimeInstallation]) -> String {
    installations
        .iter()
        .map(|inst| {
            format!(
                "{}.{}.{}\t{}\t{}",
                inst.version.major,
                inst.version.minor,
                inst.version.patch,
                inst.home.display(),
                if inst.is_jdk { "jdk" } else { "jre" }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_finds_nothing_in_empty_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let found = discover_installations(tmp.path());
        assert!(found.is_empty());
    }

    #[test]
    fn report_formats_one_line_per_installation() {
        let installations = vec![RuntimeInstallation {
            version: RuntimeVersion::parse("11.0.2").unwrap(),
            home: PathBuf::from("/opt/jdk-11"),
            is_jdk: true,
        }];
        let report = list_installations_report(&installations);
        assert_eq!(report, "11.0.2\t/opt/jdk-11\tjdk");
    }
}
