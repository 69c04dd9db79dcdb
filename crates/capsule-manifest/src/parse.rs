use std::collections::BTreeMap;

use capsule_util::errors::CapsuleError;

use crate::attribute::AttributeMap;
use crate::section::SectionId;
use crate::Manifest;

/// Parse the manifest index text format:
/// `Key-Name: value` lines, continuation lines beginning with a single
/// space, `[SectionName]` section headers, `#`-prefixed comments, and
/// blank lines ignored.
pub fn parse_index(bytes: &[u8]) -> Result<Manifest, CapsuleError> {
    let text = std::str::from_utf8(bytes).map_err(|e| CapsuleError::InvalidManifest {
        message: format!("manifest index is not valid UTF-8: {e}"),
    })?;

    let mut main = AttributeMap::new();
    let mut sections: BTreeMap<SectionId, AttributeMap> = BTreeMap::new();
    let mut current: Option<SectionId> = None;
    let mut last_key: Option<String> = None;

    for raw_line in text.lines() {
        if raw_line.starts_with(' ') {
            // Continuation of the previous value.
            if let Some(ref key) = last_key {
                let cont = raw_line.trim_start();
                let target = match &current {
                    Some(id) => sections.entry(id.clone()).or_default(),
                    None => &mut main,
                };
                let existing = target.get(key).unwrap_or_default();
                target.insert(key.clone(), format!("{existing}{cont}"));
            }
            continue;
        }

        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            last_key = None;
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            current = Some(SectionId::parse(header));
            last_key = None;
            continue;
        }

        match line.split_once(':') {
            Some((key, value)) => {
                let key = key.trim().to_string();
                let value = value.trim_start().to_string();
                let target = match &current {
                    Some(id) => sections.entry(id.clone()).or_default(),
                    None => &mut main,
                };
                target.insert(key.clone(), value);
                last_key = Some(key);
            }
            None => {
                return Err(CapsuleError::InvalidManifest {
                    message: format!("malformed manifest line: '{line}'"),
                });
            }
        }
    }

    Ok(Manifest { main, sections })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OsName;

    #[test]
    fn parses_main_section() {
        let text = b"Application-Class: com.example.Main\nApplication-Name: Example\n";
        let manifest = parse_index(text).unwrap();
        assert_eq!(
            manifest.main.get("Application-Class"),
            Some("com.example.Main".to_string())
        );
    }

    #[test]
    fn parses_continuation_lines() {
        let text = b"Class-Path: a.jar\n b.jar\n c.jar\n";
        let manifest = parse_index(text).unwrap();
        assert_eq!(manifest.main.get("Class-Path"), Some("a.jarb.jarc.jar".to_string()));
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let text = b"# a comment\n\nApplication-Class: X\n";
        let manifest = parse_index(text).unwrap();
        assert_eq!(manifest.main.get("Application-Class"), Some("X".to_string()));
    }

    #[test]
    fn parses_sections() {
        let text = b"Application-Class: X\n\n[Windows]\nApplication-Class: Y\n";
        let manifest = parse_index(text).unwrap();
        let windows = manifest.sections.get(&SectionId::Os(OsName::Windows)).unwrap();
        assert_eq!(windows.get("Application-Class"), Some("Y".to_string()));
    }

    #[test]
    fn rejects_malformed_line() {
        let text = b"not a valid line without a colon\n";
        assert!(parse_index(text).is_err());
    }
}
