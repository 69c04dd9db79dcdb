use std::io::Write as _;
use std::path::{Path, PathBuf};

use capsule_manifest::{Coordinate, VersionSpec};
use capsule_util::errors::CapsuleError;
use capsule_util::hash::sha256_bytes;

use crate::{ArtifactKind, DependencyResolver};

const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// A single non-optional, non-test/provided/system dependency parsed out
/// of a POM's `<dependencies>` block.
#[derive(Debug, Clone)]
struct PomDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
}

/// The reference network-capable [`DependencyResolver`].
///
/// Grounded in `kargo-maven`'s `MavenRepository` URL layout and on-disk
/// cache, generalized to a single-level dependency walk: `resolve_root`
/// fetches the coordinate's own POM and follows its direct dependencies
/// with "first write wins" (no nearest-wins conflict arbitration). A full
/// transitive solver is explicitly out of scope here — see the companion
/// `DESIGN.md` entry.
pub struct MavenResolver {
    repository_url: String,
    deps_root: PathBuf,
    client: reqwest::blocking::Client,
}

impl MavenResolver {
    pub fn new(deps_root: PathBuf) -> Self {
        Self {
            repository_url: MAVEN_CENTRAL_URL.to_string(),
            deps_root,
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_repository(deps_root: PathBuf, repository_url: impl Into<String>) -> Self {
        Self {
            repository_url: repository_url.into(),
            deps_root,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    fn file_url(&self, group: &str, artifact: &str, version: &str, filename: &str) -> String {
        format!(
            "{}/{}/{filename}",
            self.repository_url,
            Self::coordinate_path(group, artifact, version)
        )
    }

    fn cache_dir(&self, group: &str, artifact: &str, version: &str) -> PathBuf {
        self.deps_root
            .join(group.replace('.', "/"))
            .join(artifact)
            .join(version)
    }

    fn artifact_filename(artifact: &str, version: &str, ext: &str) -> String {
        format!("{artifact}-{version}.{ext}")
    }

    /// Fetch `url`, verifying it against a `.sha1` sidecar when one is
    /// published (Maven Central always publishes one).
    fn fetch(&self, url: &str) -> Result<Vec<u8>, CapsuleError> {
        capsule_util::progress::status_info("Downloading", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CapsuleError::ResolverFailure {
                message: format!("GET {url}: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(CapsuleError::DependencyNotFound {
                message: format!("{url} returned {}", response.status()),
            });
        }
        let bytes = response
            .bytes()
            .map_err(|e| CapsuleError::ResolverFailure {
                message: format!("reading body of {url}: {e}"),
            })?
            .to_vec();

        if let Ok(sha1_response) = self.client.get(format!("{url}.sha1")).send() {
            if sha1_response.status().is_success() {
                if let Ok(expected) = sha1_response.text() {
                    let expected = expected.trim().split_whitespace().next().unwrap_or("");
                    let actual = capsule_util::hash::sha1_bytes(&bytes);
                    if !expected.is_empty() && expected != actual {
                        return Err(CapsuleError::ResolverFailure {
                            message: format!(
                                "checksum mismatch for {url}: expected {expected}, got {actual}"
                            ),
                        });
                    }
                }
            }
        }

        Ok(bytes)
    }

    fn ensure_cached_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        ext: &str,
    ) -> Result<PathBuf, CapsuleError> {
        let dir = self.cache_dir(group, artifact, version);
        let filename = Self::artifact_filename(artifact, version, ext);
        let path = dir.join(&filename);
        if path.is_file() {
            return Ok(path);
        }

        let url = self.file_url(group, artifact, version, &filename);
        let data = self.fetch(&url)?;
        capsule_util::fs::ensure_dir(&dir)?;
        capsule_util::fs::write_atomic(&path, &data)?;
        Ok(path)
    }

    fn fetch_pom(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
    ) -> Result<Vec<PomDependency>, CapsuleError> {
        let dir = self.cache_dir(group, artifact, version);
        let pom_filename = format!("{artifact}-{version}.pom");
        let pom_path = dir.join(&pom_filename);

        let xml = if pom_path.is_file() {
            std::fs::read_to_string(&pom_path)?
        } else {
            let url = self.file_url(group, artifact, version, &pom_filename);
            let bytes = self.fetch(&url)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            capsule_util::fs::ensure_dir(&dir)?;
            capsule_util::fs::write_atomic(&pom_path, text.as_bytes())?;
            text
        };

        parse_pom_dependencies(&xml)
    }
}

impl DependencyResolver for MavenResolver {
    fn resolve(&self, coord: &Coordinate, kind: ArtifactKind) -> Result<Vec<PathBuf>, CapsuleError> {
        let version = match &coord.version {
            Some(VersionSpec::Exact(v)) => v.clone(),
            Some(VersionSpec::Range(lo, _)) => lo.clone(),
            _ => self.latest_version(coord, kind)?,
        };
        let ext = match kind {
            ArtifactKind::Jar => "jar",
            ArtifactKind::NativeLib => "jar", // native libs are still shipped inside jars on Maven Central
        };
        let path = self.ensure_cached_artifact(&coord.group, &coord.artifact, &version, ext)?;
        Ok(vec![path])
    }

    fn resolve_root(&self, coord: &Coordinate) -> Result<Vec<PathBuf>, CapsuleError> {
        let version = match &coord.version {
            Some(VersionSpec::Exact(v)) => v.clone(),
            Some(VersionSpec::Range(lo, _)) => lo.clone(),
            _ => self.latest_version(coord, ArtifactKind::Jar)?,
        };

        let mut seen = std::collections::HashMap::new();
        let root_path = self.ensure_cached_artifact(&coord.group, &coord.artifact, &version, "jar")?;
        seen.insert((coord.group.clone(), coord.artifact.clone()), root_path);

        let deps = self.fetch_pom(&coord.group, &coord.artifact, &version)?;
        for dep in deps {
            let key = (dep.group_id.clone(), dep.artifact_id.clone());
            if seen.contains_key(&key) {
                continue; // first write wins; no nearest-wins arbitration
            }
            let Some(dep_version) = dep.version else {
                continue;
            };
            if let Ok(path) =
                self.ensure_cached_artifact(&dep.group_id, &dep.artifact_id, &dep_version, "jar")
            {
                seen.insert(key, path);
            }
        }

        Ok(seen.into_values().collect())
    }

    fn latest_version(&self, coord: &Coordinate, _kind: ArtifactKind) -> Result<String, CapsuleError> {
        let url = format!(
            "{}/{}/maven-metadata.xml",
            self.repository_url,
            coord.group.replace('.', "/") + "/" + &coord.artifact
        );
        let bytes = self.fetch(&url)?;
        let xml = String::from_utf8_lossy(&bytes);
        extract_xml_tag(&xml, "release")
            .or_else(|| extract_xml_tag(&xml, "latest"))
            .ok_or_else(|| CapsuleError::DependencyNotFound {
                message: format!("no <release>/<latest> tag in metadata for {coord}"),
            })
    }

    fn print_tree(&self, coord: &Coordinate, out: &mut dyn std::io::Write) -> Result<(), CapsuleError> {
        writeln!(out, "{coord}")?;
        let version = match &coord.version {
            Some(VersionSpec::Exact(v)) => v.clone(),
            _ => self.latest_version(coord, ArtifactKind::Jar)?,
        };
        if let Ok(deps) = self.fetch_pom(&coord.group, &coord.artifact, &version) {
            for dep in deps {
                writeln!(
                    out,
                    "  {}:{}{}",
                    dep.group_id,
                    dep.artifact_id,
                    dep.version.map(|v| format!(":{v}")).unwrap_or_default()
                )?;
            }
        }
        Ok(())
    }
}

/// A minimal `<dependencies>` extractor: this is deliberately not a full
/// POM model (parent inheritance, property interpolation, BOM imports are
/// all out of scope for the simplified one-level resolver).
fn parse_pom_dependencies(xml: &str) -> Result<Vec<PomDependency>, CapsuleError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut deps = Vec::new();
    let mut in_dependencies = 0u32;
    let mut in_single_dep = false;
    let mut scope: Option<String> = None;
    let mut optional = false;
    let mut group_id = None;
    let mut artifact_id = None;
    let mut version = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "dependencies" => in_dependencies += 1,
                    "dependency" if in_dependencies > 0 => {
                        in_single_dep = true;
                        scope = None;
                        optional = false;
                        group_id = None;
                        artifact_id = None;
                        version = None;
                    }
                    _ => {}
                }
                current_tag = name;
            }
            Ok(Event::Text(t)) if in_single_dep => {
                let text = t.unescape().unwrap_or_default().into_owned();
                match current_tag.as_str() {
                    "groupId" => group_id = Some(text),
                    "artifactId" => artifact_id = Some(text),
                    "version" => version = Some(text),
                    "scope" => scope = Some(text),
                    "optional" => optional = text == "true",
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "dependencies" {
                    in_dependencies = in_dependencies.saturating_sub(1);
                } else if name == "dependency" && in_single_dep {
                    in_single_dep = false;
                    let is_excluded_scope = matches!(
                        scope.as_deref(),
                        Some("test") | Some("provided") | Some("system")
                    );
                    if !optional && !is_excluded_scope {
                        if let (Some(g), Some(a)) = (group_id.take(), artifact_id.take()) {
                            deps.push(PomDependency {
                                group_id: g,
                                artifact_id: a,
                                version: version.take(),
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CapsuleError::ResolverFailure {
                    message: format!("malformed POM XML: {e}"),
                })
            }
            _ => {}
        }
    }

    Ok(deps)
}

fn extract_xml_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(xml[start..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_pom_dependencies() {
        let xml = r#"<project>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
      <version>1.0</version>
    </dependency>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>test-only</artifactId>
      <version>2.0</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>"#;
        let deps = parse_pom_dependencies(xml).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].artifact_id, "lib");
    }

    #[test]
    fn skips_optional_dependencies() {
        let xml = r#"<project>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>opt</artifactId>
      <version>1.0</version>
      <optional>true</optional>
    </dependency>
  </dependencies>
</project>"#;
        let deps = parse_pom_dependencies(xml).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn extracts_release_tag() {
        let xml = "<metadata><versioning><release>2.1.0</release></versioning></metadata>";
        assert_eq!(extract_xml_tag(xml, "release"), Some("2.1.0".to_string()));
    }

    #[test]
    fn coordinate_path_layout() {
        assert_eq!(
            MavenResolver::coordinate_path("org.example", "lib", "1.0"),
            "org/example/lib/1.0"
        );
    }
}
