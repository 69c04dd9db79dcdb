//! The Capsule manifest index: attribute maps, section merge rules, and
//! artifact coordinate parsing.

pub mod attribute;
pub mod coordinate;
pub mod parse;
pub mod section;

pub use attribute::{AttributeKind, AttributeMap};
pub use coordinate::{Coordinate, VersionSpec};
pub use section::{OsName, SectionId};

use std::collections::BTreeMap;

use capsule_archive::Archive;
use capsule_util::errors::CapsuleError;

/// The archive entry that holds the manifest index, analogous to
/// `META-INF/MANIFEST.MF` in a regular JAR.
pub const INDEX_ENTRY_NAME: &str = "META-INF/APP-MANIFEST.MF";

/// Identity attributes that may only appear in the main section; declaring
/// one inside a named section is a structural error caught at parse time.
const IDENTITY_ATTRIBUTES: &[&str] =
    &["Application-ID", "Application-Name", "Application-Version"];

/// The resolution inputs that determine which sections of a manifest apply
/// to the current launch.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub os: OsName,
    pub runtime_major: u32,
    pub mode: Option<String>,
}

/// A parsed manifest: a main attribute set plus any number of conditional
/// sections layered on top of it.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub main: AttributeMap,
    pub sections: BTreeMap<SectionId, AttributeMap>,
}

impl Manifest {
    /// Parse a manifest index from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, CapsuleError> {
        let manifest = parse::parse_index(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse the manifest index out of an already-opened archive.
    pub fn from_archive(archive: &mut Archive) -> Result<Self, CapsuleError> {
        let bytes = archive.read(INDEX_ENTRY_NAME)?;
        Self::parse(&bytes)
    }

    /// Reject identity attributes declared outside the main section.
    pub fn validate(&self) -> Result<(), CapsuleError> {
        for (section_id, attrs) in &self.sections {
            for key in attrs.raw_keys() {
                if Self::is_identity_attribute(key) {
                    return Err(CapsuleError::InvalidManifest {
                        message: format!(
                            "identity attribute '{key}' declared in section {section_id:?}; \
                             identity attributes may only appear in the main section"
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Confirm that a requested mode section actually exists somewhere in
    /// the manifest, failing structurally (before the child process spawns)
    /// if it does not.
    pub fn validate_mode(&self, mode: &str) -> Result<(), CapsuleError> {
        let present = self.sections.keys().any(|id| id.matches_mode_name(mode));
        if present {
            Ok(())
        } else {
            Err(CapsuleError::InvalidManifest {
                message: format!("capsule.mode '{mode}' does not match any manifest section"),
            })
        }
    }

    pub fn is_identity_attribute(attr: &str) -> bool {
        IDENTITY_ATTRIBUTES.contains(&attr)
    }

    fn matching_sections(&self, ctx: &ResolutionContext) -> Vec<&AttributeMap> {
        let mut matches = Vec::new();
        for (id, attrs) in &self.sections {
            if id.matches(ctx) {
                matches.push((id, attrs));
            }
        }
        // Apply in a fixed precedence order: Os, RuntimeMajor, Mode, ModeOs,
        // ModeRuntime, each later entry overriding earlier ones.
        matches.sort_by_key(|(id, _)| id.precedence());
        matches.into_iter().map(|(_, attrs)| attrs).collect()
    }

    /// Scalar resolution: the main value, overridden in turn by every
    /// matching section that defines a non-empty value for `attr`.
    pub fn get(&self, attr: &str, ctx: &ResolutionContext) -> Option<String> {
        let mut current = self.main.get(attr);
        for section in self.matching_sections(ctx) {
            if let Some(value) = section.get(attr) {
                if !value.is_empty() {
                    current = Some(value);
                }
            }
        }
        current
    }

    /// List resolution: main tokens followed by each matching section's
    /// tokens, concatenated in section precedence order.
    pub fn get_list(&self, attr: &str, ctx: &ResolutionContext) -> Vec<String> {
        let mut out = self.main.get_list(attr);
        for section in self.matching_sections(ctx) {
            out.extend(section.get_list(attr));
        }
        out
    }

    /// Map resolution: same traversal as [`Manifest::get_list`], splitting
    /// each token on the first `=`.
    pub fn get_map(
        &self,
        attr: &str,
        ctx: &ResolutionContext,
        default_value: Option<&str>,
    ) -> Result<BTreeMap<String, String>, CapsuleError> {
        let mut out = BTreeMap::new();
        for token in self.get_list(attr, ctx) {
            attribute::insert_map_token(&mut out, &token, default_value)?;
        }
        Ok(out)
    }

    pub fn has(&self, attr: &str, ctx: &ResolutionContext) -> bool {
        self.get(attr, ctx).is_some()
    }
}
