use std::path::PathBuf;

use capsule_archive::Archive;
use capsule_manifest::{Coordinate, OsName, VersionSpec};
use capsule_util::errors::CapsuleError;

use crate::ArtifactKind;

/// Searches for a coordinate's artifact among the entries already embedded
/// in the capsule's own archive, under `lib/`. Never performs network I/O.
pub struct EmbeddedResolver<'a> {
    archive: &'a Archive,
    os: OsName,
}

impl<'a> EmbeddedResolver<'a> {
    pub fn new(archive: &'a Archive, os: OsName) -> Self {
        Self { archive, os }
    }

    /// Try each of the six candidate layouts in order; for an exact
    /// version this stops at the first entry that exists. For
    /// `VersionSpec::Any` every layout is globbed and exactly one match is
    /// required.
    pub fn find(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<Option<PathBuf>, CapsuleError> {
        let ext = kind.extension(self.os);

        match &coord.version {
            Some(VersionSpec::Exact(version)) | Some(VersionSpec::Range(version, _)) => {
                for name in candidate_names(coord, version, ext) {
                    if self.entry_exists(&name) {
                        return Ok(Some(PathBuf::from(name)));
                    }
                }
                Ok(None)
            }
            None | Some(VersionSpec::Any) => {
                let matches = self.glob_candidates(coord, ext);
                match matches.len() {
                    0 => Ok(None),
                    1 => Ok(Some(PathBuf::from(matches.into_iter().next().unwrap()))),
                    _ => Err(CapsuleError::DependencyAmbiguous {
                        message: format!(
                            "coordinate '{coord}' matched {} embedded artifacts with no version given",
                            matches.len()
                        ),
                    }),
                }
            }
        }
    }

    fn entry_exists(&self, name: &str) -> bool {
        self.archive.entry_names().any(|n| n == name)
    }

    fn glob_candidates(&self, coord: &Coordinate, ext: &str) -> Vec<String> {
        let mut builder = globset::GlobSetBuilder::new();
        for prefix in candidate_prefixes(coord) {
            if let Ok(glob) = globset::Glob::new(&format!("{prefix}*.{ext}")) {
                builder.add(glob);
            }
        }
        let set = match builder.build() {
            Ok(set) => set,
            Err(_) => return Vec::new(),
        };
        self.archive
            .entry_names()
            .filter(|name| set.is_match(name))
            .map(str::to_string)
            .collect()
    }
}

/// The three `lib/`-prefixed layouts, mirrored without the prefix, in the
/// fixed search order the spec documents.
fn candidate_names(coord: &Coordinate, version: &str, ext: &str) -> Vec<String> {
    let group = &coord.group;
    let artifact = &coord.artifact;
    let bases = [
        format!("{group}/{artifact}-{version}.{ext}"),
        format!("{group}-{artifact}-{version}.{ext}"),
        format!("{artifact}-{version}.{ext}"),
    ];
    let mut out = Vec::with_capacity(6);
    for base in &bases {
        out.push(format!("lib/{base}"));
    }
    for base in bases {
        out.push(base);
    }
    out
}

fn candidate_prefixes(coord: &Coordinate) -> Vec<String> {
    let group = &coord.group;
    let artifact = &coord.artifact;
    vec![
        format!("lib/{group}/{artifact}-"),
        format!("lib/{group}-{artifact}-"),
        format!("lib/{artifact}-"),
        format!("{group}/{artifact}-"),
        format!("{group}-{artifact}-"),
        format!("{artifact}-"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn build_test_zip(entries: &[&str]) -> tempfile::TempPath {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
            let options = zip::write::FileOptions::<()>::default();
            for name in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(b"x").unwrap();
            }
            writer.finish().unwrap();
        }
        file.into_temp_path()
    }

    #[test]
    fn finds_lib_group_artifact_layout() {
        let zip_path = build_test_zip(&["lib/org.example/app-1.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let resolver = EmbeddedResolver::new(&archive, OsName::Linux);
        let coord = Coordinate::parse("org.example:app:1.0").unwrap();
        let found = resolver.find(&coord, ArtifactKind::Jar).unwrap();
        assert_eq!(found, Some(PathBuf::from("lib/org.example/app-1.0.jar")));
    }

    #[test]
    fn ambiguous_without_version_errors() {
        let zip_path = build_test_zip(&["lib/app-1.0.jar", "lib/app-2.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let resolver = EmbeddedResolver::new(&archive, OsName::Linux);
        let coord = Coordinate::parse("org.example:app").unwrap();
        assert!(resolver.find(&coord, ArtifactKind::Jar).is_err());
    }

    #[test]
    fn clean_miss_returns_none() {
        let zip_path = build_test_zip(&["lib/other-1.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let resolver = EmbeddedResolver::new(&archive, OsName::Linux);
        let coord = Coordinate::parse("org.example:app:1.0").unwrap();
        assert_eq!(resolver.find(&coord, ArtifactKind::Jar).unwrap(), None);
    }
}
