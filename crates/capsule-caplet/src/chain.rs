use std::collections::BTreeMap;
use std::path::PathBuf;

use capsule_command::{BuildContext, CommandHooks};
use capsule_manifest::{Manifest, ResolutionContext};
use capsule_util::errors::CapsuleError;

use crate::builtin::CapletBuiltin;
use crate::caplet::Caplet;
use crate::view::{CapletView, ManifestView};

/// Attribute names resolved scalar-style, through [`Caplet::attribute`],
/// before `EffectiveAttributes` ever sees the manifest.
const SCALAR_ATTRS: &[&str] = &[
    "Application-Class",
    "Application",
    "Script",
    "Security-Manager",
    "Capsule-In-Class-Path",
];

/// An ordered pipeline of [`Caplet`] layers, built from a manifest's
/// `Caplets` attribute. Layer 0 is outermost: it sees the resolved value
/// of layer 1 (and so on) as its `inner` argument, with the base manifest
/// as the innermost view.
pub struct CapletChain {
    layers: Vec<Box<dyn Caplet>>,
}

impl CapletChain {
    pub fn empty() -> Self {
        Self { layers: Vec::new() }
    }

    /// Resolve the manifest's `Caplets` list against the built-in
    /// registry. An entry that matches no built-in is a hard error: this
    /// rendition has no dynamic class-loading equivalent, so an unknown
    /// caplet can never silently become a no-op.
    pub fn from_manifest(manifest: &Manifest, ctx: &ResolutionContext) -> Result<Self, CapsuleError> {
        Self::from_manifest_with(manifest, ctx, false)
    }

    /// As [`CapletChain::from_manifest`], but when `trust_unknown` is set,
    /// an unrecognized `Caplets` entry is skipped with a `tracing::warn!`
    /// instead of failing — the `trust-unknown-caplets` global config
    /// toggle.
    pub fn from_manifest_with(
        manifest: &Manifest,
        ctx: &ResolutionContext,
        trust_unknown: bool,
    ) -> Result<Self, CapsuleError> {
        let names = manifest.get_list("Caplets", ctx);
        let mut layers = Vec::with_capacity(names.len());
        for name in names {
            match CapletBuiltin::from_name(&name) {
                Some(caplet) => layers.push(caplet),
                None if trust_unknown => {
                    tracing::warn!("skipping unrecognized caplet '{name}'");
                }
                None => {
                    return Err(CapsuleError::InvalidManifest {
                        message: format!(
                            "caplet '{name}' is not a known built-in (dynamic caplet loading is not supported)"
                        ),
                    })
                }
            }
        }
        Ok(Self { layers })
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Thread the spawn closure through every layer's `mount_process`,
    /// outermost first: layer 0 wraps the closure produced by wrapping
    /// every later layer around `spawn`.
    pub fn mount_process(
        &self,
        spawn: Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>>,
    ) -> Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>> {
        let mut wrapped = spawn;
        for layer in self.layers.iter().rev() {
            wrapped = layer.mount_process(wrapped);
        }
        wrapped
    }

    /// Thread a single attribute lookup through every layer, outermost
    /// first, bottoming out at `base`.
    pub fn attribute(&self, name: &str, ctx: &ResolutionContext, base: &dyn CapletView) -> Option<String> {
        Self::attribute_from(&self.layers, name, ctx, base)
    }

    fn attribute_from(
        layers: &[Box<dyn Caplet>],
        name: &str,
        ctx: &ResolutionContext,
        base: &dyn CapletView,
    ) -> Option<String> {
        match layers.split_first() {
            Some((outer, rest)) => {
                let inner = RestView { layers: rest, ctx, base };
                outer.attribute(name, ctx, &inner)
            }
            None => base.attribute(name, ctx),
        }
    }

    /// Rewrite the scalar attributes every caplet layer can see, folding
    /// the chain's resolved values into the manifest's main section (and
    /// clearing any section-level overrides so a later, independent
    /// `Manifest::get` cannot undo the caplet's decision).
    pub fn transform(&self, mut manifest: Manifest, ctx: &ResolutionContext) -> Manifest {
        if self.layers.is_empty() {
            return manifest;
        }
        for attr in SCALAR_ATTRS {
            let view = ManifestView { manifest: &manifest };
            let resolved = self.attribute(attr, ctx, &view);
            match resolved {
                Some(value) => {
                    for section in manifest.sections.values_mut() {
                        section.remove(attr);
                    }
                    manifest.main.insert(*attr, value);
                }
                None => {
                    manifest.main.remove(attr);
                }
            }
        }
        manifest
    }
}

struct RestView<'a> {
    layers: &'a [Box<dyn Caplet>],
    ctx: &'a ResolutionContext,
    base: &'a dyn CapletView,
}

impl<'a> CapletView for RestView<'a> {
    fn attribute(&self, name: &str, _ctx: &ResolutionContext) -> Option<String> {
        CapletChain::attribute_from(self.layers, name, self.ctx, self.base)
    }
}

impl CommandHooks for CapletChain {
    fn classpath(&self, base: Vec<PathBuf>, bc: &BuildContext<'_>) -> Result<Vec<PathBuf>, CapsuleError> {
        let mut value = base;
        for layer in &self.layers {
            value = layer.build_classpath(value, bc)?;
        }
        Ok(value)
    }

    fn jvm_args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let mut value = base;
        for layer in &self.layers {
            value = layer.build_jvm_args(value, bc)?;
        }
        Ok(value)
    }

    fn system_properties(
        &self,
        base: BTreeMap<String, String>,
        bc: &BuildContext<'_>,
    ) -> Result<BTreeMap<String, String>, CapsuleError> {
        let mut value = base;
        for layer in &self.layers {
            value = layer.build_system_properties(value, bc)?;
        }
        Ok(value)
    }

    fn args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let mut value = base;
        for layer in &self.layers {
            value = layer.build_args(value, bc)?;
        }
        Ok(value)
    }

    fn app_id(&self, base: String) -> String {
        // `Caplet::app_id` also takes a `ResolutionContext`; the chain-wide
        // `CommandHooks::app_id` is only invoked with the identifier
        // already resolved, so a fresh, mode-less context is sufficient
        // here since no built-in caplet's `app_id` inspects it.
        let ctx = ResolutionContext {
            os: capsule_manifest::OsName::current(),
            runtime_major: 0,
            mode: None,
        };
        let mut value = base;
        for layer in &self.layers {
            value = layer.app_id(value, &ctx);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_manifest::OsName;

    fn ctx() -> ResolutionContext {
        ResolutionContext {
            os: OsName::current(),
            runtime_major: 17,
            mode: None,
        }
    }

    fn manifest_with(entries: &[(&str, &str)]) -> Manifest {
        let mut manifest = Manifest::default();
        for (k, v) in entries {
            manifest.main.insert(*k, *v);
        }
        manifest
    }

    #[test]
    fn empty_chain_transform_is_identity() {
        let manifest = manifest_with(&[("Application-Class", "com.example.Main")]);
        let chain = CapletChain::empty();
        let transformed = chain.transform(manifest, &ctx());
        assert_eq!(transformed.get("Application-Class", &ctx()), Some("com.example.Main".to_string()));
    }

    #[test]
    fn unknown_caplet_name_is_a_hard_error() {
        let manifest = manifest_with(&[("Caplets", "not.a.real.Caplet")]);
        assert!(CapletChain::from_manifest(&manifest, &ctx()).is_err());
    }

    #[test]
    fn unknown_caplet_name_is_skipped_when_trusted() {
        let manifest = manifest_with(&[("Caplets", "not.a.real.Caplet")]);
        let chain = CapletChain::from_manifest_with(&manifest, &ctx(), true).unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn identity_caplet_resolves_by_name() {
        let manifest = manifest_with(&[("Caplets", "Identity")]);
        let chain = CapletChain::from_manifest(&manifest, &ctx()).unwrap();
        assert!(!chain.is_empty());
    }

    struct RecordingCaplet {
        log: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>>,
        tag: &'static str,
    }

    impl Caplet for RecordingCaplet {
        fn mount_process(
            &self,
            spawn: Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>>,
        ) -> Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>> {
            let log = self.log.clone();
            let tag = self.tag;
            Box::new(move || {
                log.lock().unwrap().push(tag);
                spawn()
            })
        }
    }

    #[test]
    fn mount_process_wraps_outermost_layer_first() {
        let log: std::sync::Arc<std::sync::Mutex<Vec<&'static str>>> = Default::default();
        let chain = CapletChain {
            layers: vec![
                Box::new(RecordingCaplet { log: log.clone(), tag: "outer" }),
                Box::new(RecordingCaplet { log: log.clone(), tag: "inner" }),
            ],
        };

        let spawn: Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>> =
            Box::new(|| {
                Err(CapsuleError::ChildSpawnFailure {
                    message: "never actually spawned in this test".to_string(),
                })
            });
        let wrapped = chain.mount_process(spawn);
        let _ = wrapped();

        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn log_caplet_chain_passes_through_attribute_values() {
        let manifest = manifest_with(&[
            ("Caplets", "Log"),
            ("Application-Class", "com.example.Main"),
        ]);
        let chain = CapletChain::from_manifest(&manifest, &ctx()).unwrap();
        let transformed = chain.transform(manifest, &ctx());
        assert_eq!(
            transformed.get("Application-Class", &ctx()),
            Some("com.example.Main".to_string())
        );
    }
}
