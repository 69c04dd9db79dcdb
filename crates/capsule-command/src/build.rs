use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use capsule_manifest::{Manifest, ResolutionContext};
use capsule_runtime::RuntimeInstallation;
use capsule_util::errors::CapsuleError;

use crate::jvmargs::merge_keyed;
use crate::vars::{dedup_paths_keep_first, expand_vars, sanitize_archive_relative, ExpansionContext};

/// The per-invocation view of a manifest, resolved once against a
/// [`ResolutionContext`] after the caplet chain has had a chance to
/// rewrite it.
#[derive(Debug, Clone)]
pub struct EffectiveAttributes {
    pub application_class: Option<String>,
    pub application: Option<String>,
    pub script: Option<String>,
    pub jvm_args: Vec<String>,
    pub system_properties: BTreeMap<String, String>,
    pub security_manager: Option<String>,
    pub boot_class_path: Vec<String>,
    pub boot_class_path_p: Vec<String>,
    pub boot_class_path_a: Vec<String>,
    pub app_class_path: Vec<String>,
    pub library_path_a: Vec<String>,
    pub library_path_p: Vec<String>,
    pub capsule_in_class_path: bool,
    pub args: Vec<String>,
    pub environment_variables: BTreeMap<String, String>,
    pub java_agents: Vec<String>,
    pub native_agents: Vec<String>,
}

/// Mirrors the manifest's own default: `Capsule-In-Class-Path` is absent
/// far more often than it is set to `false`, so an attribute set with no
/// explicit value behaves the same as one built from an empty manifest.
impl Default for EffectiveAttributes {
    fn default() -> Self {
        Self {
            application_class: None,
            application: None,
            script: None,
            jvm_args: Vec::new(),
            system_properties: BTreeMap::new(),
            security_manager: None,
            boot_class_path: Vec::new(),
            boot_class_path_p: Vec::new(),
            boot_class_path_a: Vec::new(),
            app_class_path: Vec::new(),
            library_path_a: Vec::new(),
            library_path_p: Vec::new(),
            capsule_in_class_path: true,
            args: Vec::new(),
            environment_variables: BTreeMap::new(),
            java_agents: Vec::new(),
            native_agents: Vec::new(),
        }
    }
}

impl EffectiveAttributes {
    pub fn build(manifest: &Manifest, ctx: &ResolutionContext) -> Result<Self, CapsuleError> {
        Ok(Self {
            application_class: manifest.get("Application-Class", ctx),
            application: manifest.get("Application", ctx),
            script: manifest.get("Script", ctx),
            jvm_args: manifest.get_list("JVM-Args", ctx),
            system_properties: manifest.get_map("System-Properties", ctx, None).unwrap_or_default(),
            security_manager: manifest.get("Security-Manager", ctx),
            boot_class_path: manifest.get_list("Boot-Class-Path", ctx),
            boot_class_path_p: manifest.get_list("Boot-Class-Path-P", ctx),
            boot_class_path_a: manifest.get_list("Boot-Class-Path-A", ctx),
            app_class_path: manifest.get_list("App-Class-Path", ctx),
            library_path_a: manifest.get_list("Library-Path-A", ctx),
            library_path_p: manifest.get_list("Library-Path-P", ctx),
            capsule_in_class_path: manifest.get("Capsule-In-Class-Path", ctx).as_deref() != Some("false"),
            args: manifest.get_list("Args", ctx),
            environment_variables: manifest.get_map("Environment-Variables", ctx, None).unwrap_or_default(),
            java_agents: manifest.get_list("Java-Agents", ctx),
            native_agents: manifest.get_list("Native-Agents", ctx),
        })
    }
}

/// Everything [`build_command`] needs to assemble the child process
/// invocation.
pub struct BuildContext<'a> {
    pub attrs: &'a EffectiveAttributes,
    pub runtime: &'a RuntimeInstallation,
    pub app_cache_dir: Option<&'a Path>,
    pub archive_path: &'a Path,
    pub dependency_paths: Vec<PathBuf>,
    pub java_agent_paths: Vec<(PathBuf, Option<String>)>,
    pub native_agent_paths: Vec<(PathBuf, Option<String>)>,
    /// Directories holding resolved `Native-Dependencies-*` libraries
    /// (already renamed on disk where the manifest requested it), merged
    /// onto `java.library.path` alongside `Library-Path-A`/`-P`.
    pub native_library_dirs: Vec<PathBuf>,
    pub host_args: &'a [String],
    pub host_system_properties: BTreeMap<String, String>,
    pub host_jvm_args: Vec<String>,
}

/// The fully-assembled invocation of the child JVM (or capsule `Script`).
#[derive(Debug, Clone)]
pub struct ChildCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

fn java_bin(home: &Path) -> PathBuf {
    if cfg!(windows) {
        home.join("bin").join("java.exe")
    } else {
        home.join("bin").join("java")
    }
}

/// Extension points a caplet chain may hook into, applied after the
/// corresponding base vector/map is computed from the manifest and before
/// it is rendered into command-line form. Every default just returns its
/// `base` argument unchanged.
pub trait CommandHooks {
    fn classpath(&self, base: Vec<PathBuf>, bc: &BuildContext<'_>) -> Result<Vec<PathBuf>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }
    fn jvm_args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }
    fn system_properties(
        &self,
        base: BTreeMap<String, String>,
        bc: &BuildContext<'_>,
    ) -> Result<BTreeMap<String, String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }
    fn args(&self, base: Vec<String>, bc: &BuildContext<'_>) -> Result<Vec<String>, CapsuleError> {
        let _ = bc;
        Ok(base)
    }
    fn app_id(&self, base: String) -> String {
        base
    }
}

/// Assemble the child command, following the eight-step construction
/// order: program, runtime flags, system properties, boot classpath,
/// application classpath, agents, main class, application args.
///
/// `hooks` is consulted, when present, after each of the runtime-flags,
/// system-properties, classpath and application-args steps, and when
/// deriving the `capsule.app`/`CAPSULE_APP` identifier — this is the seam
/// a caplet chain attaches to.
pub fn build_command(bc: &BuildContext<'_>) -> Result<ChildCommand, CapsuleError> {
    build_command_with_hooks(bc, None)
}

/// As [`build_command`], but threading every computed piece through
/// `hooks` before it is rendered into the final command line.
pub fn build_command_with_hooks(
    bc: &BuildContext<'_>,
    hooks: Option<&dyn CommandHooks>,
) -> Result<ChildCommand, CapsuleError> {
    let expansion = ExpansionContext {
        archive_path: bc.archive_path,
        app_cache_dir: bc.app_cache_dir,
        java_home: &bc.runtime.home,
    };

    // 1. Program.
    let program = match (&bc.attrs.script, bc.app_cache_dir) {
        (Some(script), Some(cache_dir)) => {
            let relative = sanitize_archive_relative(script)?;
            let path = cache_dir.join(relative);
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = path.metadata() {
                    let mut perms = meta.permissions();
                    perms.set_mode(perms.mode() | 0o111);
                    let _ = std::fs::set_permissions(&path, perms);
                }
            }
            path
        }
        _ => java_bin(&bc.runtime.home),
    };

    let using_script = program != java_bin(&bc.runtime.home);
    let mut args: Vec<String> = Vec::new();

    if !using_script {
        // 2. Runtime flags.
        let manifest_args = expand_list(&bc.attrs.jvm_args, &expansion)?;
        let mut merged_jvm_args = merge_keyed(&manifest_args, &bc.host_jvm_args);
        if let Some(h) = hooks {
            merged_jvm_args = h.jvm_args(merged_jvm_args, bc)?;
        }
        args.extend(merged_jvm_args);

        // 3. System properties.
        let mut props = bc.attrs.system_properties.clone();
        for (k, v) in &bc.host_system_properties {
            props.insert(k.clone(), v.clone());
        }
        let app_id = match hooks {
            Some(h) => h.app_id(app_id_property(bc)),
            None => app_id_property(bc),
        };
        props.insert("capsule.app".to_string(), app_id);
        props.insert(
            "capsule.jar".to_string(),
            bc.archive_path.to_string_lossy().into_owned(),
        );
        if let Some(dir) = bc.app_cache_dir {
            props.insert("capsule.dir".to_string(), dir.to_string_lossy().into_owned());
        }
        if let Some(ref sm) = bc.attrs.security_manager {
            props.insert("java.security.manager".to_string(), sm.clone());
        }
        let library_path = assemble_library_path(bc, &expansion)?;
        if !library_path.is_empty() {
            props.insert(
                "java.library.path".to_string(),
                library_path.join(capsule_util::classpath_separator()),
            );
        }
        if let Some(h) = hooks {
            props = h.system_properties(props, bc)?;
        }
        for (k, v) in &props {
            let v = expand_vars(v, &expansion)?;
            args.push(format!("-D{k}={v}"));
        }

        // 4. Boot classpath.
        push_boot_classpath(&mut args, "-Xbootclasspath:", &bc.attrs.boot_class_path, &expansion)?;
        push_boot_classpath(&mut args, "-Xbootclasspath/p:", &bc.attrs.boot_class_path_p, &expansion)?;
        push_boot_classpath(&mut args, "-Xbootclasspath/a:", &bc.attrs.boot_class_path_a, &expansion)?;

        // 5. Application classpath.
        let mut classpath = assemble_classpath(bc, &expansion)?;
        if let Some(h) = hooks {
            classpath = h.classpath(classpath, bc)?;
        }
        if !classpath.is_empty() {
            args.push("-cp".to_string());
            args.push(capsule_util::join_classpath(&classpath));
        }

        // 6. Agents.
        for (path, agent_args) in &bc.java_agent_paths {
            args.push(format!(
                "-javaagent:{}{}",
                path.display(),
                agent_args.as_ref().map(|a| format!("={a}")).unwrap_or_default()
            ));
        }
        for (path, agent_args) in &bc.native_agent_paths {
            args.push(format!(
                "-agentpath:{}{}",
                path.display(),
                agent_args.as_ref().map(|a| format!("={a}")).unwrap_or_default()
            ));
        }

        // 7. Main class.
        match (&bc.attrs.application_class, &bc.attrs.application) {
            (Some(class), _) => args.push(class.clone()),
            (None, Some(app)) => {
                let coord = capsule_manifest::Coordinate::parse(app).ok_or_else(|| {
                    CapsuleError::MissingEntrypoint {
                        message: format!("Application coordinate '{app}' could not be parsed"),
                    }
                })?;
                let main_jar = bc
                    .dependency_paths
                    .iter()
                    .find(|p| {
                        p.file_stem()
                            .map(|s| s.to_string_lossy().starts_with(&coord.artifact))
                            .unwrap_or(false)
                    })
                    .cloned()
                    .unwrap_or_else(|| bc.archive_path.to_path_buf());
                args.push("-jar".to_string());
                args.push(main_jar.to_string_lossy().into_owned());
            }
            (None, None) => {
                return Err(CapsuleError::MissingEntrypoint {
                    message: "manifest declares neither Application-Class nor Application"
                        .to_string(),
                })
            }
        }
    }

    // 8. Application args.
    let mut manifest_args = expand_list(&bc.attrs.args, &expansion)?;
    if let Some(h) = hooks {
        manifest_args = h.args(manifest_args, bc)?;
    }
    args.extend(manifest_args);
    args.extend(bc.host_args.iter().cloned());

    let env = build_environment(bc, &expansion)?;

    Ok(ChildCommand {
        program,
        args,
        env,
        cwd: None,
    })
}

fn app_id_property(bc: &BuildContext<'_>) -> String {
    bc.attrs
        .application_class
        .clone()
        .or_else(|| bc.attrs.application.clone())
        .unwrap_or_default()
}

fn expand_list(values: &[String], ctx: &ExpansionContext<'_>) -> Result<Vec<String>, CapsuleError> {
    values.iter().map(|v| expand_vars(v, ctx)).collect()
}

fn push_boot_classpath(
    args: &mut Vec<String>,
    flag: &str,
    entries: &[String],
    ctx: &ExpansionContext<'_>,
) -> Result<(), CapsuleError> {
    if entries.is_empty() {
        return Ok(());
    }
    let expanded = expand_list(entries, ctx)?;
    args.push(format!("{flag}{}", expanded.join(capsule_util::classpath_separator())));
    Ok(())
}

fn assemble_classpath(
    bc: &BuildContext<'_>,
    ctx: &ExpansionContext<'_>,
) -> Result<Vec<PathBuf>, CapsuleError> {
    if !bc.attrs.capsule_in_class_path && bc.app_cache_dir.is_none() {
        return Err(CapsuleError::AttributeMisuse {
            message: "Capsule-In-Class-Path is false but the capsule was not extracted, \
                      so there is no in-cache classpath to fall back on"
                .to_string(),
        });
    }

    let mut classpath = Vec::new();

    if bc.attrs.capsule_in_class_path {
        classpath.push(bc.archive_path.to_path_buf());
    }

    for entry in &bc.attrs.app_class_path {
        let relative = sanitize_archive_relative(entry)?;
        let expanded = expand_vars(relative, ctx)?;
        classpath.push(PathBuf::from(expanded));
    }

    if bc.attrs.app_class_path.is_empty() {
        if let Some(dir) = bc.app_cache_dir {
            if let Ok(entries) = std::fs::read_dir(dir) {
                let mut jars: Vec<PathBuf> = entries
                    .flatten()
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "jar"))
                    .collect();
                jars.sort();
                classpath.extend(jars);
            }
        }
    }

    classpath.extend(bc.dependency_paths.iter().cloned());

    Ok(dedup_paths_keep_first(classpath))
}

/// `Library-Path-P` (prepended), resolved native dependency directories,
/// then `Library-Path-A` (appended) — mirroring the boot-classpath
/// prepend/append convention used elsewhere in this builder.
fn assemble_library_path(
    bc: &BuildContext<'_>,
    ctx: &ExpansionContext<'_>,
) -> Result<Vec<String>, CapsuleError> {
    let mut entries = expand_list(&bc.attrs.library_path_p, ctx)?;
    entries.extend(
        bc.native_library_dirs
            .iter()
            .map(|p| p.to_string_lossy().into_owned()),
    );
    entries.extend(expand_list(&bc.attrs.library_path_a, ctx)?);
    Ok(entries)
}

fn build_environment(
    bc: &BuildContext<'_>,
    _ctx: &ExpansionContext<'_>,
) -> Result<BTreeMap<String, String>, CapsuleError> {
    let mut env: BTreeMap<String, String> = std::env::vars().collect();

    for (key, value) in &bc.attrs.environment_variables {
        if let Some(stripped) = key.strip_suffix(':') {
            env.insert(stripped.to_string(), value.clone());
        } else {
            env.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    env.insert(
        "JAVA_HOME".to_string(),
        bc.runtime.home.to_string_lossy().into_owned(),
    );
    env.insert("CAPSULE_APP".to_string(), app_id_property(bc));
    env.insert(
        "CAPSULE_JAR".to_string(),
        bc.archive_path.to_string_lossy().into_owned(),
    );
    if let Some(dir) = bc.app_cache_dir {
        env.insert("CAPSULE_DIR".to_string(), dir.to_string_lossy().into_owned());
    }

    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_runtime::RuntimeVersion;

    fn runtime() -> RuntimeInstallation {
        RuntimeInstallation {
            version: RuntimeVersion::parse("17.0.1").unwrap(),
            home: PathBuf::from("/opt/jdk-17"),
            is_jdk: true,
        }
    }

    #[test]
    fn missing_entrypoint_errors() {
        let attrs = EffectiveAttributes::default();
        let runtime = runtime();
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: Vec::new(),
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: Vec::new(),
            host_args: &[],
            host_system_properties: BTreeMap::new(),
            host_jvm_args: Vec::new(),
        };
        assert!(build_command(&bc).is_err());
    }

    #[test]
    fn uses_application_class_as_main() {
        let mut attrs = EffectiveAttributes::default();
        attrs.application_class = Some("com.example.Main".to_string());
        let runtime = runtime();
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: Vec::new(),
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: Vec::new(),
            host_args: &["--flag".to_string()],
            host_system_properties: BTreeMap::new(),
            host_jvm_args: Vec::new(),
        };
        let cmd = build_command(&bc).unwrap();
        assert_eq!(cmd.program, java_bin(&runtime.home));
        assert!(cmd.args.contains(&"com.example.Main".to_string()));
        assert_eq!(cmd.args.last(), Some(&"--flag".to_string()));
    }

    #[test]
    fn capsule_in_class_path_adds_archive() {
        let mut attrs = EffectiveAttributes::default();
        attrs.application_class = Some("com.example.Main".to_string());
        let runtime = runtime();
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: Vec::new(),
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: Vec::new(),
            host_args: &[],
            host_system_properties: BTreeMap::new(),
            host_jvm_args: Vec::new(),
        };
        let cmd = build_command(&bc).unwrap();
        let cp_index = cmd.args.iter().position(|a| a == "-cp").unwrap();
        assert!(cmd.args[cp_index + 1].contains("my.capsule"));
    }

    #[test]
    fn capsule_in_class_path_false_without_extraction_is_an_error() {
        let mut attrs = EffectiveAttributes::default();
        attrs.application_class = Some("com.example.Main".to_string());
        attrs.capsule_in_class_path = false;
        let runtime = runtime();
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: Vec::new(),
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: Vec::new(),
            host_args: &[],
            host_system_properties: BTreeMap::new(),
            host_jvm_args: Vec::new(),
        };
        let err = build_command(&bc).unwrap_err();
        assert!(matches!(err, CapsuleError::AttributeMisuse { .. }));
    }

    #[test]
    fn native_library_dirs_become_java_library_path() {
        let mut attrs = EffectiveAttributes::default();
        attrs.application_class = Some("com.example.Main".to_string());
        let runtime = runtime();
        let bc = BuildContext {
            attrs: &attrs,
            runtime: &runtime,
            app_cache_dir: None,
            archive_path: Path::new("/app/my.capsule"),
            dependency_paths: Vec::new(),
            java_agent_paths: Vec::new(),
            native_agent_paths: Vec::new(),
            native_library_dirs: vec![PathBuf::from("/app/cache/.capsule-native")],
            host_args: &[],
            host_system_properties: BTreeMap::new(),
            host_jvm_args: Vec::new(),
        };
        let cmd = build_command(&bc).unwrap();
        assert!(cmd
            .args
            .iter()
            .any(|a| a.starts_with("-Djava.library.path=") && a.contains(".capsule-native")));
    }
}
