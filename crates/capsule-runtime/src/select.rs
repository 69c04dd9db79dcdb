use std::collections::BTreeMap;

use capsule_util::errors::CapsuleError;

use crate::discover::RuntimeInstallation;
use crate::version::RuntimeVersion;

/// Version/feature constraints a runtime must satisfy, built from a
/// manifest's `Min-Runtime-Version`, `Max-Runtime-Version`, and
/// `Min-Update-Version` attributes.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConstraints {
    pub min: Option<RuntimeVersion>,
    pub max_major: Option<u32>,
    pub min_update_per_major: BTreeMap<u32, i64>,
    pub jdk_required: bool,
}

impl RuntimeConstraints {
    pub fn matches(&self, install: &RuntimeInstallation) -> bool {
        if let Some(ref min) = self.min {
            if &install.version < min {
                return false;
            }
        }
        if let Some(max_major) = self.max_major {
            if install.version.major > max_major {
                return false;
            }
        }
        if let Some(&min_update) = self.min_update_per_major.get(&install.version.major) {
            if install.version.update < min_update {
                return false;
            }
        }
        if self.jdk_required && !install.is_jdk {
            return false;
        }
        true
    }
}

/// Parse the whitespace-separated `Min-Update-Version` map, e.g.
/// `"7=85 1.8=21"`, keyed by major version.
///
/// Only classic dotted-major keys (`"1.8"`, `"7"`) are normalized here.
/// Modern single-number majors behave the same as any other token and are
/// not further canonicalized; this mirrors the historical Capsule
/// implementation's own undefined behavior for `shortJavaVersion` on
/// majors >= 9, which this port intentionally does not paper over.
pub fn parse_min_update_version(raw: &BTreeMap<String, String>) -> BTreeMap<u32, i64> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let major = if let Some(rest) = key.strip_prefix("1.") {
            rest.parse().ok()
        } else {
            key.parse().ok()
        };
        if let (Some(major), Ok(update)) = (major, value.parse::<i64>()) {
            out.insert(major, update);
        }
    }
    out
}

/// Pick the best runtime from `candidates`, falling back to `current` (the
/// runtime the launcher itself is executing under) if it matches and no
/// discovered candidate does.
pub fn select_runtime(
    candidates: &[RuntimeInstallation],
    constraints: &RuntimeConstraints,
    current: &RuntimeInstallation,
) -> Result<RuntimeInstallation, CapsuleError> {
    let best = candidates
        .iter()
        .filter(|c| constraints.matches(c))
        .max_by(|a, b| (&a.version, a.is_jdk).cmp(&(&b.version, b.is_jdk)));

    if let Some(best) = best {
        return Ok(best.clone());
    }

    if constraints.matches(current) {
        return Ok(current.clone());
    }

    Err(CapsuleError::NoMatchingRuntime {
        message: "no discovered or current runtime satisfies the manifest's constraints"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn install(version: &str, is_jdk: bool) -> RuntimeInstallation {
        RuntimeInstallation {
            version: RuntimeVersion::parse(version).unwrap(),
            home: PathBuf::from(format!("/opt/{version}")),
            is_jdk,
        }
    }

    #[test]
    fn picks_highest_matching_version() {
        let candidates = vec![install("11.0.2", false), install("17.0.1", false)];
        let constraints = RuntimeConstraints::default();
        let current = install("8.0.0", true);
        let chosen = select_runtime(&candidates, &constraints, &current).unwrap();
        assert_eq!(chosen.version.major, 17);
    }

    #[test]
    fn jdk_beats_jre_at_equal_version() {
        let candidates = vec![install("11.0.2", false), install("11.0.2", true)];
        let constraints = RuntimeConstraints::default();
        let current = install("8.0.0", true);
        let chosen = select_runtime(&candidates, &constraints, &current).unwrap();
        assert!(chosen.is_jdk);
    }

    #[test]
    fn falls_back_to_current_when_no_candidate_matches() {
        let candidates = vec![install("6.0.0", false)];
        let constraints = RuntimeConstraints {
            min: Some(RuntimeVersion::parse("11.0.0").unwrap()),
            ..Default::default()
        };
        let current = install("17.0.0", true);
        let chosen = select_runtime(&candidates, &constraints, &current).unwrap();
        assert_eq!(chosen.version.major, 17);
    }

    #[test]
    fn fails_when_nothing_matches() {
        let candidates = vec![install("6.0.0", false)];
        let constraints = RuntimeConstraints {
            min: Some(RuntimeVersion::parse("11.0.0").unwrap()),
            ..Default::default()
        };
        let current = install("8.0.0", true);
        assert!(select_runtime(&candidates, &constraints, &current).is_err());
    }

    #[test]
    fn parses_min_update_version_map() {
        let mut raw = BTreeMap::new();
        raw.insert("7".to_string(), "85".to_string());
        raw.insert("1.8".to_string(), "21".to_string());
        let parsed = parse_min_update_version(&raw);
        assert_eq!(parsed.get(&7), Some(&85));
        assert_eq!(parsed.get(&8), Some(&21));
    }
}
