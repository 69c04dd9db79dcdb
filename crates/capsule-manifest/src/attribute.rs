use std::collections::BTreeMap;

use capsule_util::errors::CapsuleError;

/// How a built-in attribute's value is combined across sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// A later section's value replaces the running value outright.
    Scalar,
    /// Values are whitespace-tokenized and concatenated across sections.
    List,
    /// Like `List`, but each token is further split on `=` into a map entry.
    Map,
}

/// The static merge-behavior table for attributes named in the manifest
/// grammar. Anything not listed here defaults to [`AttributeKind::Scalar`];
/// callers may still call `get_list`/`get_map` on any key regardless of
/// this table, which only governs the built-in accessor used internally.
pub fn attribute_kind(name: &str) -> AttributeKind {
    match name {
        "Dependencies" | "Native-Dependencies" | "Caplets" | "App-Class-Path" | "Class-Path"
        | "Boot-Class-Path" | "Library-Path-A" | "Library-Path-P" => AttributeKind::List,
        "System-Properties" | "Environment-Variables" | "JVM-Args" | "Min-Update-Version" => {
            AttributeKind::Map
        }
        _ => AttributeKind::Scalar,
    }
}

/// Split a `key=value` (or bare `key`) token into a map entry, using
/// `default_value` when no `=` is present.
pub fn insert_map_token(
    out: &mut BTreeMap<String, String>,
    token: &str,
    default_value: Option<&str>,
) -> Result<(), CapsuleError> {
    match token.split_once('=') {
        Some((k, v)) => {
            out.insert(k.to_string(), v.to_string());
        }
        None => {
            let v = default_value.ok_or_else(|| CapsuleError::AttributeMisuse {
                message: format!("token '{token}' has no '=' and no default value was supplied"),
            })?;
            out.insert(token.to_string(), v.to_string());
        }
    }
    Ok(())
}

/// A raw key/value attribute set for one section (or the main section) of
/// a manifest. Values are stored unsplit; typed access happens in
/// [`crate::Manifest`]'s resolution methods.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    raw: BTreeMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.raw.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.raw.get(key).cloned()
    }

    pub fn remove(&mut self, key: &str) {
        self.raw.remove(key);
    }

    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.raw
            .get(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn raw_keys(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_attributes_classified() {
        assert_eq!(attribute_kind("Dependencies"), AttributeKind::List);
        assert_eq!(attribute_kind("System-Properties"), AttributeKind::Map);
        assert_eq!(attribute_kind("Application-Class"), AttributeKind::Scalar);
    }

    #[test]
    fn map_token_without_equals_uses_default() {
        let mut out = BTreeMap::new();
        insert_map_token(&mut out, "DEBUG", Some("true")).unwrap();
        assert_eq!(out.get("DEBUG"), Some(&"true".to_string()));
    }

    #[test]
    fn map_token_without_equals_or_default_errors() {
        let mut out = BTreeMap::new();
        assert!(insert_map_token(&mut out, "DEBUG", None).is_err());
    }
}
