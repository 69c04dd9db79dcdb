/// A parsed JVM version, comparable in `(major, minor, patch, update)`
/// tuple order. Prerelease builds are encoded as negative `update` values
/// (`ea` = -1, `beta` = -2, `rc` = -3) so they sort below the final
/// release of the same `(major, minor, patch)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub update: i64,
    pub prerelease: Option<String>,
}

impl RuntimeVersion {
    /// Parse both the legacy `"1.8.0_202"` format and the modern
    /// `"11.0.2"` / `"17-ea"` format.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_matches('"');

        let (version_part, prerelease) = match s.split_once('-') {
            Some((v, tag)) => (v, Some(tag.to_string())),
            None => (s, None),
        };

        // Legacy: 1.8.0_202
        if let Some((base, update_str)) = version_part.split_once('_') {
            let base_parts: Vec<&str> = base.split('.').collect();
            if base_parts.len() == 3 && base_parts[0] == "1" {
                let major = base_parts[1].parse().ok()?;
                let patch = base_parts[2].parse().ok()?;
                let update: i64 = update_str.parse().ok()?;
                return Some(Self {
                    major,
                    minor: 0,
                    patch,
                    update,
                    prerelease,
                });
            }
        }

        let parts: Vec<&str> = version_part.split('.').collect();
        if parts.is_empty() {
            return None;
        }
        let major: u32 = parts[0].parse().ok()?;
        let minor: u32 = parts.get(1).and_then(|p| p.parse().ok()).unwrap_or(0);
        let patch: u32 = parts.get(2).and_then(|p| p.parse().ok()).unwrap_or(0);

        let update = prerelease_update_value(prerelease.as_deref());

        Some(Self {
            major,
            minor,
            patch,
            update,
            prerelease,
        })
    }
}

fn prerelease_update_value(tag: Option<&str>) -> i64 {
    match tag.map(str::to_ascii_lowercase).as_deref() {
        Some("rc") => -3,
        Some("beta") => -2,
        Some("ea") => -1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_format() {
        let v = RuntimeVersion::parse("1.8.0_202").unwrap();
        assert_eq!(v.major, 8);
        assert_eq!(v.patch, 0);
        assert_eq!(v.update, 202);
    }

    #[test]
    fn parses_modern_format() {
        let v = RuntimeVersion::parse("11.0.2").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (11, 0, 2));
        assert_eq!(v.update, 0);
    }

    #[test]
    fn parses_modern_prerelease() {
        let v = RuntimeVersion::parse("17-ea").unwrap();
        assert_eq!(v.major, 17);
        assert_eq!(v.update, -1);
        assert_eq!(v.prerelease.as_deref(), Some("ea"));
    }

    #[test]
    fn prerelease_sorts_below_final_release() {
        let ea = RuntimeVersion::parse("17-ea").unwrap();
        let release = RuntimeVersion::parse("17.0.0").unwrap();
        assert!(ea < release);
    }

    #[test]
    fn quoted_string_is_trimmed() {
        let v = RuntimeVersion::parse("\"11.0.2\"").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (11, 0, 2));
    }
}
