/// How a coordinate's version requirement is expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// No version constraint; resolve to "latest".
    Any,
    /// An exact version string.
    Exact(String),
    /// A Maven-style range, e.g. `[1.0,2.0)`. Bound comparison is delegated
    /// to the same dotted lexicographic comparison used for runtime
    /// versions, since Maven artifact versions are not full semver.
    Range(String, String),
}

/// A Maven-style artifact coordinate:
/// `group:artifact[:version[:classifier]](excl1, excl2, ...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: Option<VersionSpec>,
    pub classifier: Option<String>,
    pub exclusions: Vec<String>,
}

impl Coordinate {
    /// Parse a coordinate string. Returns `None` if it does not contain at
    /// least a `group:artifact` pair.
    pub fn parse(s: &str) -> Option<Self> {
        let (body, exclusions) = match s.find('(') {
            Some(idx) => {
                let excl_str = s[idx + 1..].trim_end_matches(')');
                let exclusions = excl_str
                    .split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect();
                (&s[..idx], exclusions)
            }
            None => (s, Vec::new()),
        };

        let parts: Vec<&str> = body.split(':').collect();
        if parts.len() < 2 {
            return None;
        }

        let group = parts[0].to_string();
        let artifact = parts[1].to_string();
        let version = parts.get(2).map(|v| parse_version_spec(v));
        let classifier = parts.get(3).map(|c| c.to_string());

        Some(Self {
            group,
            artifact,
            version,
            classifier,
            exclusions,
        })
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)?;
        if let Some(ref v) = self.version {
            match v {
                VersionSpec::Exact(s) => write!(f, ":{s}")?,
                VersionSpec::Range(lo, hi) => write!(f, ":[{lo},{hi})")?,
                VersionSpec::Any => {}
            }
        }
        if let Some(ref c) = self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}

fn parse_version_spec(s: &str) -> VersionSpec {
    if s.is_empty() {
        return VersionSpec::Any;
    }
    if let Some(inner) = s.strip_prefix('[').and_then(|s| s.strip_suffix(')')) {
        if let Some((lo, hi)) = inner.split_once(',') {
            return VersionSpec::Range(lo.to_string(), hi.to_string());
        }
    }
    VersionSpec::Exact(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_artifact_version() {
        let c = Coordinate::parse("org.example:app:1.2.3").unwrap();
        assert_eq!(c.group, "org.example");
        assert_eq!(c.artifact, "app");
        assert_eq!(c.version, Some(VersionSpec::Exact("1.2.3".to_string())));
    }

    #[test]
    fn parses_classifier() {
        let c = Coordinate::parse("org.example:app:1.2.3:linux-x86_64").unwrap();
        assert_eq!(c.classifier, Some("linux-x86_64".to_string()));
    }

    #[test]
    fn parses_exclusions() {
        let c = Coordinate::parse("org.example:app:1.2.3(org.foo:bar, org.baz:qux)").unwrap();
        assert_eq!(c.exclusions, vec!["org.foo:bar", "org.baz:qux"]);
    }

    #[test]
    fn parses_version_range() {
        let c = Coordinate::parse("org.example:app:[1.0,2.0)").unwrap();
        assert_eq!(
            c.version,
            Some(VersionSpec::Range("1.0".to_string(), "2.0".to_string()))
        );
    }

    #[test]
    fn rejects_too_few_parts() {
        assert!(Coordinate::parse("just-an-artifact").is_none());
    }
}
