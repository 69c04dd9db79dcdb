use std::path::PathBuf;

use capsule_archive::Archive;
use capsule_manifest::{Coordinate, OsName};
use capsule_util::errors::CapsuleError;

use crate::embedded::EmbeddedResolver;
use crate::{ArtifactKind, DependencyResolver, NativeDependencyEntry};

/// Composes an [`EmbeddedResolver`] (tried first) with an injected
/// [`DependencyResolver`] (tried second). A coordinate satisfied by an
/// embedded artifact never reaches the injected resolver; an *ambiguous*
/// embedded match is still a hard error, not a fallthrough.
pub struct CapsuleAdapter<'a, R: DependencyResolver> {
    embedded: EmbeddedResolver<'a>,
    fallback: R,
    os: OsName,
}

impl<'a, R: DependencyResolver> CapsuleAdapter<'a, R> {
    pub fn new(archive: &'a Archive, fallback: R, os: OsName) -> Self {
        Self {
            embedded: EmbeddedResolver::new(archive, os),
            fallback,
            os,
        }
    }

    /// Resolve each `Native-Dependencies-{Linux,Mac,Win}` entry, pairing
    /// the resolved path with its optional rename.
    pub fn resolve_native(
        &self,
        entries: &[NativeDependencyEntry],
    ) -> Result<Vec<(PathBuf, Option<String>)>, CapsuleError> {
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            let paths = self.resolve(&entry.coordinate, ArtifactKind::NativeLib)?;
            for path in paths {
                out.push((path, entry.rename.clone()));
            }
        }
        Ok(out)
    }

    pub fn os(&self) -> OsName {
        self.os
    }
}

impl<'a, R: DependencyResolver> DependencyResolver for CapsuleAdapter<'a, R> {
    fn resolve(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<Vec<PathBuf>, CapsuleError> {
        if let Some(path) = self.embedded.find(coord, kind)? {
            return Ok(vec![path]);
        }
        self.fallback.resolve(coord, kind)
    }

    fn resolve_root(&self, coord: &Coordinate) -> Result<Vec<PathBuf>, CapsuleError> {
        if let Some(path) = self.embedded.find(coord, ArtifactKind::Jar)? {
            return Ok(vec![path]);
        }
        self.fallback.resolve_root(coord)
    }

    fn latest_version(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<String, CapsuleError> {
        self.fallback.latest_version(coord, kind)
    }

    fn print_tree(&self, coord: &Coordinate, out: &mut dyn std::io::Write) -> Result<(), CapsuleError> {
        self.fallback.print_tree(coord, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    struct StubResolver;

    impl DependencyResolver for StubResolver {
        fn resolve(&self, _coord: &Coordinate, _kind: ArtifactKind) -> Result<Vec<PathBuf>, CapsuleError> {
            Ok(vec![PathBuf::from("/fallback/artifact.jar")])
        }
        fn resolve_root(&self, _coord: &Coordinate) -> Result<Vec<PathBuf>, CapsuleError> {
            Ok(vec![PathBuf::from("/fallback/artifact.jar")])
        }
        fn latest_version(&self, _coord: &Coordinate, _kind: ArtifactKind) -> Result<String, CapsuleError> {
            Ok("1.0".to_string())
        }
        fn print_tree(&self, _coord: &Coordinate, out: &mut dyn std::io::Write) -> Result<(), CapsuleError> {
            writeln!(out, "stub")?;
            Ok(())
        }
    }

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
    fn embedded_match_short_circuits_fallback() {
        let zip_path = build_test_zip(&["lib/org.example/app-1.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let adapter = CapsuleAdapter::new(&archive, StubResolver, OsName::Linux);
        let coord = Coordinate::parse("org.example:app:1.0").unwrap();
        let resolved = adapter.resolve(&coord, ArtifactKind::Jar).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("lib/org.example/app-1.0.jar")]);
    }

    #[test]
    fn clean_miss_falls_through_to_injected_resolver() {
        let zip_path = build_test_zip(&["lib/unrelated-1.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let adapter = CapsuleAdapter::new(&archive, StubResolver, OsName::Linux);
        let coord = Coordinate::parse("org.example:app:1.0").unwrap();
        let resolved = adapter.resolve(&coord, ArtifactKind::Jar).unwrap();
        assert_eq!(resolved, vec![PathBuf::from("/fallback/artifact.jar")]);
    }

    #[test]
    fn ambiguous_embedded_match_does_not_fall_through() {
        let zip_path = build_test_zip(&["lib/app-1.0.jar", "lib/app-2.0.jar"]);
        let archive = Archive::open(&zip_path).unwrap();
        let adapter = CapsuleAdapter::new(&archive, StubResolver, OsName::Linux);
        let coord = Coordinate::parse("org.example:app").unwrap();
        assert!(adapter.resolve(&coord, ArtifactKind::Jar).is_err());
    }
}
