use std::collections::BTreeMap;
use std::path::PathBuf;

/// Process-wide log verbosity, mapped to a `tracing` `EnvFilter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    None,
    #[default]
    Quiet,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Quiet => "error",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// The process-wide immutable config, constructed once by `capsule-cli`
/// and threaded by reference through the whole launch pipeline — there is
/// no mutable global state anywhere in this crate.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfig {
    pub log_level: LogLevel,
    pub mode: Option<String>,
    pub java_home: Option<PathBuf>,
    pub java_cmd: Option<PathBuf>,
    pub reset: bool,

    /// `capsule.app.id` override: takes the place of the derived
    /// application id (see `AppCache::id_for`) when set.
    pub app_id_override: Option<String>,

    /// Host-supplied `-D` system properties, parsed by `capsule-cli` from
    /// `CAPSULE_PROP_<NAME>=<value>` environment variables.
    pub host_system_properties: BTreeMap<String, String>,
    /// Extra JVM arguments merged ahead of the manifest's own `JVM-Args`.
    pub host_jvm_args: Vec<String>,

    /// Mirrors the global `trust-unknown-caplets` config toggle: when set,
    /// an unrecognized `Caplets` entry is skipped with a warning instead
    /// of failing the launch.
    pub trust_unknown_caplets: bool,

    pub action_print_version: bool,
    pub action_list_runtimes: bool,
    pub action_list_modes: bool,
    pub action_print_tree: bool,
    pub action_resolve_only: bool,
}

impl LauncherConfig {
    pub fn any_action_requested(&self) -> bool {
        self.action_print_version
            || self.action_list_runtimes
            || self.action_list_modes
            || self.action_print_tree
            || self.action_resolve_only
    }
}

/// The launcher's exit status: `0` on a clean action or a child that
/// exited successfully, otherwise the child's own exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
}
