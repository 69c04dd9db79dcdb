use std::path::Path;

use capsule_archive::Archive;
use capsule_cache::{AppCache, CacheContext, CacheRoot};
use capsule_caplet::CapletChain;
use capsule_command::{build_command_with_hooks, BuildContext, EffectiveAttributes};
use capsule_manifest::{Coordinate, Manifest, OsName, ResolutionContext};
use capsule_resolve::{ArtifactKind, CapsuleAdapter, DependencyResolver, MavenResolver, NativeDependencyEntry};
use capsule_runtime::{
    discover_installations, is_jdk_home, parse_min_update_version, probe_version, select_runtime,
    RuntimeConstraints, RuntimeInstallation, RuntimeVersion,
};
use capsule_util::errors::CapsuleError;
use capsule_util::process::{ChildSpec, Supervisor};

use crate::actions;
use crate::config::{ExitCode, LauncherConfig};

/// Host-known runtime/OS combinations with a documented stdio-inheritance
/// defect. Empty by default — no currently supported runtime is known to
/// trigger it; kept as an extensible, documented hook rather than a
/// populated blocklist.
fn has_known_inheritance_defect(_install: &RuntimeInstallation) -> bool {
    false
}

pub struct Launcher;

impl Launcher {
    /// Run one capsule archive end-to-end, or dispatch an early-exit action.
    pub fn run(
        archive_path: &Path,
        app_args: &[String],
        config: &LauncherConfig,
    ) -> Result<ExitCode, CapsuleError> {
        if config.any_action_requested() {
            Self::run_actions(archive_path, config)?;
            return Ok(ExitCode::SUCCESS);
        }

        let mut archive = Archive::open(archive_path)?;
        let manifest = Manifest::from_archive(&mut archive)?;
        manifest.validate()?;
        if let Some(mode) = &config.mode {
            manifest.validate_mode(mode)?;
        }

        let current = current_runtime(config)?;

        let ctx = ResolutionContext {
            os: OsName::current(),
            runtime_major: current.version.major,
            mode: config.mode.clone(),
        };

        let chain = CapletChain::from_manifest_with(&manifest, &ctx, config.trust_unknown_caplets)?;
        let manifest = chain.transform(manifest, &ctx);

        let id = match &config.app_id_override {
            Some(id) => id.clone(),
            None => AppCache::id_for(&manifest, &ctx)?,
        };
        let version = manifest.get("Application-Version", &ctx);
        let cache_root = CacheRoot::resolve_or_temp()?;
        let mut cache_ctx = CacheContext {
            archive: &mut archive,
            manifest: &manifest,
            ctx: &ctx,
            reset: config.reset,
        };
        let app_cache_dir =
            AppCache::prepare(cache_root.path(), &id, version.as_deref(), &mut cache_ctx)?;
        if config.reset {
            AppCache::reset(cache_root.path(), &id)?;
        }

        let deps_root = cache_root.path().join("deps");
        let maven = MavenResolver::new(deps_root);
        let adapter = CapsuleAdapter::new(&archive, maven, ctx.os);
        let cache_dir = app_cache_dir.as_deref();

        let mut dependency_paths = Vec::new();
        for token in manifest.get_list("Dependencies", &ctx) {
            let coord = Coordinate::parse(&token).ok_or_else(|| CapsuleError::InvalidManifest {
                message: format!("'{token}' is not a valid dependency coordinate"),
            })?;
            dependency_paths.extend(
                adapter
                    .resolve_root(&coord)?
                    .into_iter()
                    .map(|p| to_filesystem_path(p, cache_dir)),
            );
        }

        let native_attr = match ctx.os {
            OsName::Linux => "Native-Dependencies-Linux",
            OsName::Mac => "Native-Dependencies-Mac",
            OsName::Windows => "Native-Dependencies-Win",
            OsName::Posix => "Native-Dependencies-Linux",
        };
        let native_entries: Vec<NativeDependencyEntry> = manifest
            .get_list(native_attr, &ctx)
            .iter()
            .filter_map(|t| NativeDependencyEntry::parse(t))
            .collect();
        let native_paths: Vec<(std::path::PathBuf, Option<String>)> = adapter
            .resolve_native(&native_entries)?
            .into_iter()
            .map(|(p, rename)| (to_filesystem_path(p, cache_dir), rename))
            .collect();
        let native_library_dirs = stage_native_libraries(cache_dir, &native_paths)?;

        let java_agent_paths = resolve_coordinate_list(&manifest.get_list("Java-Agents", &ctx), &adapter, cache_dir)?;
        let native_agent_paths =
            resolve_coordinate_list(&manifest.get_list("Native-Agents", &ctx), &adapter, cache_dir)?;

        let runtime = select_runtime_for(&manifest, &ctx, &current, config)?;

        let attrs = EffectiveAttributes::build(&manifest, &ctx)?;
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: cache_dir,
            archive_path,
            dependency_paths,
            java_agent_paths,
            native_agent_paths,
            native_library_dirs,
            host_args: app_args,
            host_system_properties: config.host_system_properties.clone(),
            host_jvm_args: config.host_jvm_args.clone(),
        };
        let child_command = build_command_with_hooks(&bc, Some(&chain))?;

        // Re-entrant capsule: the resolved main artifact is itself a capsule.
        if let Some(inner_archive_path) = reentrant_capsule_path(&attrs, &bc) {
            return Self::run(&inner_archive_path, app_args, config);
        }

        capsule_util::progress::status(
            "Running",
            attrs.application_class.as_deref().unwrap_or(&id),
        );

        let mut spec = ChildSpec::new(child_command.program).args(child_command.args);
        for (k, v) in child_command.env {
            spec = spec.env(k, v);
        }
        if let Some(dir) = child_command.cwd {
            spec = spec.cwd(dir);
        }

        let mount = |spawn| chain.mount_process(spawn);
        let outcome = if has_known_inheritance_defect(&runtime) {
            Supervisor::run_piped_mounted(&spec, mount)?
        } else {
            Supervisor::run_inherited_mounted(
                &spec,
                |pid| {
                    std::env::set_var("CAPSULE_APP_PID", pid.to_string());
                },
                mount,
            )?
        };

        Ok(ExitCode(outcome.code))
    }

    fn run_actions(archive_path: &Path, config: &LauncherConfig) -> Result<(), CapsuleError> {
        if config.action_print_version {
            actions::print_version(archive_path)?;
        }
        if config.action_list_runtimes {
            actions::list_runtimes()?;
        }
        if config.action_list_modes || config.action_print_tree || config.action_resolve_only {
            let mut archive = Archive::open(archive_path)?;
            let manifest = Manifest::from_archive(&mut archive)?;
            if config.action_list_modes {
                actions::list_modes(&manifest)?;
            }
            if config.action_print_tree || config.action_resolve_only {
                let current = current_runtime(config)?;
                let ctx = ResolutionContext {
                    os: OsName::current(),
                    runtime_major: current.version.major,
                    mode: config.mode.clone(),
                };
                let cache_root = CacheRoot::resolve_or_temp()?;
                let maven = MavenResolver::new(cache_root.path().join("deps"));
                let adapter = CapsuleAdapter::new(&archive, maven, ctx.os);
                if config.action_print_tree {
                    actions::print_tree(archive_path, &manifest, &ctx, &adapter)?;
                }
                if config.action_resolve_only {
                    actions::resolve_only(&manifest, &ctx, &adapter)?;
                }
            }
        }
        Ok(())
    }
}

/// The runtime the launcher process is itself executing under, or the
/// explicit `java_home`/`java_cmd` override when configured.
fn current_runtime(config: &LauncherConfig) -> Result<RuntimeInstallation, CapsuleError> {
    if let Some(ref home) = config.java_home {
        return probe_current(home);
    }
    if let Some(ref cmd) = config.java_cmd {
        let home = cmd
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cmd.clone());
        return probe_current(&home);
    }
    if let Some(home) = std::env::var_os("JAVA_HOME").map(std::path::PathBuf::from) {
        return probe_current(&home);
    }

    // No JAVA_HOME and no override: treat the process's own working
    // directory as a last-resort probe target, recovering per §7's policy
    // of never failing discovery outright on a single probe miss.
    let home = std::path::PathBuf::from(".");
    let version = probe_version(&home).unwrap_or_else(|_| RuntimeVersion::parse("0.0.0").unwrap());
    Ok(RuntimeInstallation {
        version,
        home,
        is_jdk: false,
    })
}

fn probe_current(home: &Path) -> Result<RuntimeInstallation, CapsuleError> {
    let version = probe_version(home).map_err(|message| CapsuleError::NoMatchingRuntime { message })?;
    Ok(RuntimeInstallation {
        version,
        is_jdk: is_jdk_home(home),
        home: home.to_path_buf(),
    })
}

fn select_runtime_for(
    manifest: &Manifest,
    ctx: &ResolutionContext,
    current: &RuntimeInstallation,
    config: &LauncherConfig,
) -> Result<RuntimeInstallation, CapsuleError> {
    if let Some(ref home) = config.java_home {
        return probe_current(home);
    }
    if let Some(ref cmd) = config.java_cmd {
        let home = cmd
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cmd.clone());
        return probe_current(&home);
    }

    let constraints = build_constraints(manifest, ctx);
    let candidates = discover_installations(&current.home);
    select_runtime(&candidates, &constraints, current)
}

fn build_constraints(manifest: &Manifest, ctx: &ResolutionContext) -> RuntimeConstraints {
    let min = manifest
        .get("Min-Runtime-Version", ctx)
        .and_then(|v| RuntimeVersion::parse(&v));
    let max_major = manifest
        .get("Max-Runtime-Version", ctx)
        .and_then(|v| v.parse().ok());
    let raw_min_update = manifest.get_map("Min-Update-Version", ctx, None).unwrap_or_default();
    let min_update_per_major = parse_min_update_version(&raw_min_update);
    let jdk_required = manifest.get("JDK-Required", ctx).as_deref() == Some("true");

    RuntimeConstraints {
        min,
        max_major,
        min_update_per_major,
        jdk_required,
    }
}

fn resolve_coordinate_list(
    tokens: &[String],
    adapter: &CapsuleAdapter<'_, MavenResolver>,
    cache_dir: Option<&Path>,
) -> Result<Vec<(std::path::PathBuf, Option<String>)>, CapsuleError> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let coord = Coordinate::parse(token).ok_or_else(|| CapsuleError::InvalidManifest {
            message: format!("'{token}' is not a valid coordinate"),
        })?;
        let paths = adapter.resolve(&coord, ArtifactKind::Jar)?;
        for path in paths {
            out.push((to_filesystem_path(path, cache_dir), None));
        }
    }
    Ok(out)
}

/// `EmbeddedResolver` returns archive-entry-relative names (e.g.
/// `lib/app-1.0.jar`); resolve those against the extracted app cache
/// directory. `MavenResolver` always returns absolute on-disk paths, which
/// pass through unchanged.
fn to_filesystem_path(path: std::path::PathBuf, cache_dir: Option<&Path>) -> std::path::PathBuf {
    if path.is_absolute() {
        return path;
    }
    match cache_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

/// Materialize renamed native libraries under their requested filename in
/// a dedicated cache subdirectory, and return the set of directories to
/// merge onto `java.library.path` (the staging dir for renamed entries,
/// plus each un-renamed entry's own parent directory).
fn stage_native_libraries(
    cache_dir: Option<&Path>,
    entries: &[(std::path::PathBuf, Option<String>)],
) -> Result<Vec<std::path::PathBuf>, CapsuleError> {
    let mut dirs = Vec::new();
    let renamed: Vec<_> = entries.iter().filter(|(_, rename)| rename.is_some()).collect();

    if !renamed.is_empty() {
        if let Some(cache_dir) = cache_dir {
            let staging = cache_dir.join(".capsule-native");
            capsule_util::fs::ensure_dir(&staging)?;
            for (path, rename) in &renamed {
                let name = rename.as_deref().unwrap();
                let data = std::fs::read(path)?;
                capsule_util::fs::write_atomic(&staging.join(name), &data)?;
            }
            dirs.push(staging);
        } else {
            tracing::warn!("native library rename requested but no app cache directory is available; using original filenames");
        }
    }

    for (path, rename) in entries {
        if rename.is_none() {
            if let Some(parent) = path.parent() {
                if !dirs.contains(&parent.to_path_buf()) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
    }

    Ok(dirs)
}

/// When `Application` names a coordinate whose resolved artifact is itself
/// a capsule archive, return its path so the caller can recurse instead of
/// spawning a JVM directly.
fn reentrant_capsule_path(
    attrs: &EffectiveAttributes,
    bc: &BuildContext<'_>,
) -> Option<std::path::PathBuf> {
    if attrs.application_class.is_some() {
        return None;
    }
    let app = attrs.application.as_ref()?;
    let coord = Coordinate::parse(app)?;
    let candidate = bc
        .dependency_paths
        .iter()
        .find(|p| {
            p.file_stem()
                .map(|s| s.to_string_lossy().starts_with(&coord.artifact))
                .unwrap_or(false)
        })?
        .clone();

    let mut inner = Archive::open(&candidate).ok()?;
    let inner_manifest = Manifest::from_archive(&mut inner).ok()?;
    if inner_manifest.main.get("Application-ID").is_some() {
        Some(candidate)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_manifest::AttributeMap;
    use std::collections::BTreeMap as Map;

    fn ctx() -> ResolutionContext {
        ResolutionContext {
            os: OsName::current(),
            runtime_major: 17,
            mode: None,
        }
    }

    fn manifest_with(entries: &[(&str, &str)]) -> Manifest {
        let mut main = AttributeMap::new();
        for (k, v) in entries {
            main.insert(*k, *v);
        }
        Manifest {
            main,
            sections: Map::new(),
        }
    }

    #[test]
    fn to_filesystem_path_passes_through_absolute() {
        let p = std::path::PathBuf::from("/deps/lib/app-1.0.jar");
        assert_eq!(to_filesystem_path(p.clone(), Some(Path::new("/cache/app"))), p);
    }

    #[test]
    fn to_filesystem_path_joins_relative_against_cache_dir() {
        let p = std::path::PathBuf::from("lib/app-1.0.jar");
        let joined = to_filesystem_path(p, Some(Path::new("/cache/app")));
        assert_eq!(joined, std::path::PathBuf::from("/cache/app/lib/app-1.0.jar"));
    }

    #[test]
    fn build_constraints_reads_runtime_attributes() {
        let manifest = manifest_with(&[
            ("Min-Runtime-Version", "11.0.0"),
            ("Max-Runtime-Version", "21"),
            ("JDK-Required", "true"),
        ]);
        let constraints = build_constraints(&manifest, &ctx());
        assert_eq!(constraints.max_major, Some(21));
        assert!(constraints.jdk_required);
        assert!(constraints.min.is_some());
    }

    #[test]
    fn reentrant_capsule_path_is_none_when_application_class_set() {
        let mut attrs = EffectiveAttributes::default();
        attrs.application_class = Some("com.example.Main".to_string());
        attrs.application = Some("org.example:app:1.0".to_string());
        let runtime = RuntimeInstallation {
            version: RuntimeVersion::parse("17.0.1").unwrap(),
            home: std::path::PathBuf::from("/opt/jdk-17"),
            is_jdk: true,
        };
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: vec![std::path::PathBuf::from("/deps/app-1.0.jar")],
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: Vec::new(),
            host_args: &[],
            host_system_properties: Map::new(),
            host_jvm_args: Vec::new(),
        };
        assert!(reentrant_capsule_path(&attrs, &bc).is_none());
    }

    #[test]
    fn stage_native_libraries_uses_parent_dir_when_no_rename() {
        let entries = vec![(std::path::PathBuf::from("/deps/native/libfoo.so"), None)];
        let dirs = stage_native_libraries(None, &entries).unwrap();
        assert_eq!(dirs, vec![std::path::PathBuf::from("/deps/native")]);
    }
}
