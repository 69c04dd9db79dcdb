use std::collections::BTreeMap;
use std::path::PathBuf;

use capsule_command::{BuildContext, CommandHooks};
use capsule_manifest::ResolutionContext;
use capsule_util::errors::CapsuleError;

use crate::view::CapletView;

/// A single layer of the caplet chain. Every hook defaults to a
/// pass-through of its `base`/`inner` argument, so a caplet only
/// implements the hooks it actually cares about.
pub trait Caplet {
    fn attribute(&self, name: &str, ctx: &ResolutionContext, inner: &dyn CapletView) -> Option<String> {
        inner.attribute(name, ctx)
    }

    fn build_classpath(
        &self,
        base: Vec<PathBuf>,
        bc: &BuildContext<'_>,
    ) -> Result<Vec<PathBuf>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }

    fn build_jvm_args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }

    fn build_system_properties(
        &self,
        base: BTreeMap<String, String>,
        bc: &BuildContext<'_>,
    ) -> Result<BTreeMap<String, String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }

    fn build_args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }

    fn app_id(&self, base: String, ctx: &ResolutionContext) -> String {
        let _ = ctx;
        base
    }

    /// Wraps the spawn closure itself, e.g. to run setup immediately
    /// before the child process is created. The default does nothing.
    fn mount_process(
        &self,
        spawn: Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>>,
    ) -> Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>> {
        spawn
    }
}
