use std::collections::BTreeSet;
use std::path::Path;

use capsule_archive::Archive;
use capsule_manifest::{Manifest, ResolutionContext, SectionId};
use capsule_resolve::DependencyResolver;
use capsule_runtime::{discover_installations, list_installations_report};
use capsule_util::errors::CapsuleError;
use capsule_util::home_dir;

/// `capsule.version`: prints `<Application-ID> <Application-Version>`.
pub fn print_version(archive_path: &Path) -> Result<(), CapsuleError> {
    let mut archive = Archive::open(archive_path)?;
    let manifest = Manifest::from_archive(&mut archive)?;
    let id = manifest.main.get("Application-ID").unwrap_or_default();
    let version = manifest.main.get("Application-Version").unwrap_or_default();
    println!("{id} {version}");
    Ok(())
}

/// `capsule.jvms`: lists discovered runtime installations.
pub fn list_runtimes() -> Result<(), CapsuleError> {
    let start = home_dir().unwrap_or_else(|| Path::new(".").to_path_buf());
    let installations = discover_installations(&start);
    print!("{}", list_installations_report(&installations));
    Ok(())
}

/// `capsule.modes`: lists the distinct mode names declared anywhere in the
/// manifest (i.e. every section that isn't purely `Os`/`RuntimeMajor`).
pub fn list_modes(manifest: &Manifest) -> Result<(), CapsuleError> {
    let mut modes = BTreeSet::new();
    for section_id in manifest.sections.keys() {
        match section_id {
            SectionId::Mode(m) | SectionId::ModeOs(m, _) | SectionId::ModeRuntime(m, _) => {
                modes.insert(m.clone());
            }
            SectionId::Os(_) | SectionId::RuntimeMajor(_) => {}
        }
    }
    for mode in modes {
        println!("{mode}");
    }
    Ok(())
}

/// `capsule.tree`: resolves `Dependencies` and prints each direct
/// coordinate's dependency tree.
pub fn print_tree(
    archive_path: &Path,
    manifest: &Manifest,
    ctx: &ResolutionContext,
    resolver: &dyn DependencyResolver,
) -> Result<(), CapsuleError> {
    let _ = archive_path;
    let mut out = std::io::stdout();
    for token in manifest.get_list("Dependencies", ctx) {
        let coord = capsule_manifest::Coordinate::parse(&token).ok_or_else(|| {
            CapsuleError::InvalidManifest {
                message: format!("'{token}' is not a valid dependency coordinate"),
            }
        })?;
        resolver.print_tree(&coord, &mut out)?;
    }
    Ok(())
}

/// `capsule.resolve`: forces resolution of every declared
/// dependency/agent/native-lib without building a command or spawning.
pub fn resolve_only(
    manifest: &Manifest,
    ctx: &ResolutionContext,
    resolver: &dyn DependencyResolver,
) -> Result<(), CapsuleError> {
    for attr in ["Dependencies", "Java-Agents", "Native-Agents"] {
        for token in manifest.get_list(attr, ctx) {
            let coord = capsule_manifest::Coordinate::parse(&token).ok_or_else(|| {
                CapsuleError::InvalidManifest {
                    message: format!("'{token}' is not a valid coordinate"),
                }
            })?;
            resolver.resolve_root(&coord)?;
        }
    }
    Ok(())
}
