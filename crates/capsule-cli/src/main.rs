//! `capsule` binary entry point.
//!
//! Parses arguments, initializes logging, loads the global config, and
//! dispatches into [`capsule_launcher::Launcher`].

mod cli;
mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;

use capsule_archive::Archive;
use capsule_launcher::{ExitCode, Launcher, LauncherConfig, LogLevel};
use miette::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    let global = config::GlobalConfig::load().unwrap_or_default();

    let log_level = parse_log_level(&args.log, &global);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level.as_filter_str()))
        .with_writer(std::io::stderr)
        .init();

    let (archive_path, app_args) = resolve_invocation(&args)?;

    let mut host_jvm_args: Vec<String> = args
        .jvm_args
        .as_deref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    host_jvm_args.extend(env_jvm_args());

    let config = LauncherConfig {
        log_level,
        mode: args.mode.clone(),
        java_home: args.java_home.clone(),
        java_cmd: args.java_cmd.clone(),
        reset: args.reset,
        app_id_override: args.app_id.clone(),
        host_system_properties: host_properties_from_env(),
        host_jvm_args,
        trust_unknown_caplets: global.trust_unknown_caplets,
        action_print_version: args.version_action,
        action_list_runtimes: args.jvms,
        action_list_modes: args.modes,
        action_print_tree: args.tree,
        action_resolve_only: args.resolve,
    };

    let exit = Launcher::run(&archive_path, &app_args, &config)?;
    std::process::exit(exit_status(exit));
}

fn exit_status(exit: ExitCode) -> i32 {
    exit.0
}

fn parse_log_level(raw: &str, global: &config::GlobalConfig) -> LogLevel {
    let effective = if raw == "quiet" {
        global.default_log_level.as_deref().unwrap_or(raw)
    } else {
        raw
    };
    match effective {
        "none" => LogLevel::None,
        "verbose" => LogLevel::Verbose,
        "debug" => LogLevel::Debug,
        _ => LogLevel::Quiet,
    }
}

/// Determine which archive to launch and which trailing args to pass it.
///
/// In the ordinary invocation, `args.archive` names the archive directly.
/// In the Unix self-executing mode (§6), `capsule` is invoked with no
/// archive argument because the running binary's own path *is* the
/// capsule archive (a shell-header-prefixed ZIP made executable); this is
/// detected by checking whether `argv[0]`'s resolved path opens as a valid
/// archive.
fn resolve_invocation(args: &cli::Cli) -> Result<(PathBuf, Vec<String>)> {
    if let Some(ref path) = args.archive {
        return Ok((path.clone(), args.app_args.clone()));
    }

    let self_path = std::env::current_exe().map_err(capsule_util::errors::CapsuleError::from)?;
    if Archive::open(&self_path).is_ok() {
        let mut app_args = vec![];
        app_args.extend(std::env::args().skip(1));
        return Ok((self_path, app_args));
    }

    Err(capsule_util::errors::CapsuleError::InvalidManifest {
        message: "no archive given and the running executable is not itself a capsule".to_string(),
    }
    .into())
}

/// Collect `CAPSULE_PROP_<NAME>=<value>` environment variables into host
/// `-D` system properties, the native-binary analogue of JVM `-D` flags
/// passed ahead of `capsule <jar>`.
fn host_properties_from_env() -> BTreeMap<String, String> {
    const PREFIX: &str = "CAPSULE_PROP_";
    std::env::vars()
        .filter_map(|(k, v)| {
            k.strip_prefix(PREFIX)
                .map(|name| (name.to_ascii_lowercase().replace('_', "."), v))
        })
        .collect()
}

fn env_jvm_args() -> Vec<String> {
    std::env::var("CAPSULE_JVM_ARGS")
        .ok()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_caps_prop_env_vars() {
        std::env::set_var("CAPSULE_PROP_MY_FLAG", "1");
        let props = host_properties_from_env();
        assert_eq!(props.get("my.flag"), Some(&"1".to_string()));
        std::env::remove_var("CAPSULE_PROP_MY_FLAG");
    }

    #[test]
    fn quiet_log_level_falls_back_to_global_default() {
        let global = config::GlobalConfig {
            default_log_level: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(parse_log_level("quiet", &global), LogLevel::Debug);
    }

    #[test]
    fn explicit_log_level_overrides_global_default() {
        let global = config::GlobalConfig {
            default_log_level: Some("debug".to_string()),
            ..Default::default()
        };
        assert_eq!(parse_log_level("verbose", &global), LogLevel::Verbose);
    }
}
