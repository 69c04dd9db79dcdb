//! CLI argument definitions for `capsule`.
//!
//! Every flag has a `CAPSULE_`-prefixed environment variable fallback
//! (clap's `env` feature), mirroring the process-wide `capsule.*` system
//! properties of the historical implementation, which has no analogue for
//! a native binary's own argv.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "capsule",
    version,
    about = "Launch a self-describing, self-executing JVM application archive"
)]
pub struct Cli {
    /// Path to the capsule archive to launch. When omitted, `capsule`
    /// checks whether its own executable path is itself a valid capsule
    /// (the Unix self-executing invocation mode).
    pub archive: Option<PathBuf>,

    /// Arguments passed through to the launched application.
    #[arg(last = true)]
    pub app_args: Vec<String>,

    /// Re-extract the application cache even if it looks up to date.
    #[arg(long, env = "CAPSULE_RESET")]
    pub reset: bool,

    /// Log verbosity: none, quiet, verbose, debug.
    #[arg(long, env = "CAPSULE_LOG", default_value = "quiet")]
    pub log: String,

    /// Select a named manifest mode section.
    #[arg(long, env = "CAPSULE_MODE")]
    pub mode: Option<String>,

    /// Override JVM home, bypassing runtime discovery.
    #[arg(long, env = "CAPSULE_JAVA_HOME")]
    pub java_home: Option<PathBuf>,

    /// Override the `java` executable directly.
    #[arg(long, env = "CAPSULE_JAVA_CMD")]
    pub java_cmd: Option<PathBuf>,

    /// Extra JVM arguments, merged ahead of the manifest's own `JVM-Args`.
    #[arg(long, env = "CAPSULE_JVM_ARGS")]
    pub jvm_args: Option<String>,

    /// Override the derived application id used for the app-cache directory.
    #[arg(long, env = "CAPSULE_APP_ID")]
    pub app_id: Option<String>,

    /// `capsule.version`: print the application id and version, then exit.
    #[arg(long, env = "CAPSULE_VERSION")]
    pub version_action: bool,

    /// `capsule.jvms`: list discovered runtime installations, then exit.
    #[arg(long, env = "CAPSULE_JVMS")]
    pub jvms: bool,

    /// `capsule.modes`: list the manifest's named mode sections, then exit.
    #[arg(long, env = "CAPSULE_MODES")]
    pub modes: bool,

    /// `capsule.tree`: print the resolved dependency tree, then exit.
    #[arg(long, env = "CAPSULE_TREE")]
    pub tree: bool,

    /// `capsule.resolve`: force-resolve every declared dependency, then exit.
    #[arg(long, env = "CAPSULE_RESOLVE")]
    pub resolve: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
