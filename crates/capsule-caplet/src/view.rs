use capsule_manifest::{Manifest, ResolutionContext};

/// A read-only attribute lookup, satisfied by either the base manifest or
/// the next layer inward in a [`crate::CapletChain`].
pub trait CapletView {
    fn attribute(&self, name: &str, ctx: &ResolutionContext) -> Option<String>;
}

/// The innermost view: a plain manifest lookup with no caplet involved.
pub struct ManifestView<'a> {
    pub manifest: &'a Manifest,
}

impl<'a> CapletView for ManifestView<'a> {
    fn attribute(&self, name: &str, ctx: &ResolutionContext) -> Option<String> {
        self.manifest.get(name, ctx)
    }
}
