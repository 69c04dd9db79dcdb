use capsule_manifest::ResolutionContext;

use crate::caplet::Caplet;
use crate::view::CapletView;

/// A pure pass-through layer: useful as a placeholder `Caplets` entry and
/// in tests that want a non-empty chain without behavior changes.
pub struct IdentityCaplet;

impl Caplet for IdentityCaplet {}

/// Logs every attribute lookup that passes through it at `trace` level.
/// Stands in for a dynamically-loaded diagnostic caplet: it observes, but
/// never changes, the values it forwards.
pub struct LogCaplet;

impl Caplet for LogCaplet {
    fn attribute(&self, name: &str, ctx: &ResolutionContext, inner: &dyn CapletView) -> Option<String> {
        let value = inner.attribute(name, ctx);
        tracing::trace!(attribute = name, value = ?value, "caplet attribute lookup");
        value
    }
}

/// Resolves a `Caplets` entry by name against the small built-in
/// registry. Coordinate-style entries (`group:artifact`) are not
/// resolvable here: dynamically loading foreign code has no safe static
/// equivalent in this rendition.
pub struct CapletBuiltin;

impl CapletBuiltin {
    pub fn from_name(name: &str) -> Option<Box<dyn Caplet>> {
        match name {
            "Identity" => Some(Box::new(IdentityCaplet)),
            "Log" => Some(Box::new(LogCaplet)),
            _ => None,
        }
    }
}
