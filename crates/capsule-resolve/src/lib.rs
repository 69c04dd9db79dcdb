//! The dependency resolution seam: Capsule's core only needs *a* resolver
//! that can turn coordinates into file paths. The full Maven transitive
//! resolution algorithm lives outside this crate's scope — this module
//! defines the trait and ships one reference implementation.

pub mod adapter;
pub mod embedded;
pub mod maven;

use std::path::PathBuf;

use capsule_manifest::{Coordinate, OsName};
use capsule_util::errors::CapsuleError;

pub use adapter::CapsuleAdapter;
pub use embedded::EmbeddedResolver;
pub use maven::MavenResolver;

/// Whether a resolved artifact is a JAR or a platform-native library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Jar,
    NativeLib,
}

impl ArtifactKind {
    /// The file extension to search for, given the host OS for native libs.
    pub fn extension(self, os: OsName) -> &'static str {
        match self {
            ArtifactKind::Jar => "jar",
            ArtifactKind::NativeLib => match os {
                OsName::Windows => "dll",
                OsName::Mac => "dylib",
                _ => "so",
            },
        }
    }
}

/// A native dependency declared under `Native-Dependencies-{Linux,Mac,Win}`,
/// with an optional rename applied after resolution.
#[derive(Debug, Clone)]
pub struct NativeDependencyEntry {
    pub coordinate: Coordinate,
    pub rename: Option<String>,
}

impl NativeDependencyEntry {
    /// Parse one whitespace-delimited token. Both `,<newname>` and
    /// `=<newname>` are accepted as the rename separator: the historical
    /// implementation's own documentation is inconsistent about which one
    /// is canonical, and both forms appear in the wild, so this parser
    /// deliberately accepts either.
    pub fn parse(token: &str) -> Option<Self> {
        let (coord_str, rename) = match token.find(['=', ',']) {
            Some(idx) => (&token[..idx], Some(token[idx + 1..].to_string())),
            None => (token, None),
        };
        let coordinate = Coordinate::parse(coord_str)?;
        Some(Self { coordinate, rename })
    }
}

/// A seam for resolving dependency coordinates to on-disk artifact paths.
/// The transitive-resolution *algorithm* is explicitly out of scope for
/// this crate; implementors decide how much of the dependency graph they
/// actually walk.
pub trait DependencyResolver {
    fn resolve(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<Vec<PathBuf>, CapsuleError>;

    /// The coordinate's own artifact plus its transitive closure.
    fn resolve_root(&self, coord: &Coordinate) -> Result<Vec<PathBuf>, CapsuleError>;

    fn latest_version(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<String, CapsuleError>;

    fn print_tree(
        &self,
        coord: &Coordinate,
        out: &mut dyn std::io::Write,
    ) -> Result<(), CapsuleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_dependency_parses_comma_rename() {
        let entry = NativeDependencyEntry::parse("org.example:native:1.0,libnative.so").unwrap();
        assert_eq!(entry.rename.as_deref(), Some("libnative.so"));
    }

    #[test]
    fn native_dependency_parses_equals_rename() {
        let entry = NativeDependencyEntry::parse("org.example:native:1.0=libnative.so").unwrap();
        assert_eq!(entry.rename.as_deref(), Some("libnative.so"));
    }

    #[test]
    fn native_dependency_without_rename() {
        let entry = NativeDependencyEntry::parse("org.example:native:1.0").unwrap();
        assert_eq!(entry.rename, None);
    }
}
