//! Process construction, spawning, stdio forwarding, and signal-aware
//! supervision of a launched child process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::errors::CapsuleError;

/// A fully-built child process description, independent of how it is
/// eventually spawned.
#[derive(Debug, Clone)]
pub struct ChildSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl ChildSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    fn to_command(&self, inherit_stdio: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        if inherit_stdio {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        cmd
    }
}

/// Outcome of supervising a spawned child through to completion.
#[derive(Debug, Clone, Copy)]
pub struct ExitOutcome {
    pub code: i32,
}

/// Spawns a [`ChildSpec`], forwards termination signals into the child's
/// process group, and waits for it to exit.
///
/// By default stdio is inherited directly from the parent (the common
/// case). [`Supervisor::run_piped`] instead spawns with piped stdio and
/// forwards bytes through forwarding threads, for runtimes with a known
/// stdio-inheritance defect (see the runtime locator's
/// `has_known_inheritance_defect`).
pub struct Supervisor;

/// The raw "create the child process" step, boxed so a caplet's
/// `mount_process` hook can wrap it before the supervisor takes over
/// waiting and signal forwarding.
pub type SpawnFn = Box<dyn FnOnce() -> Result<std::process::Child, CapsuleError>>;

/// Identity mount: wraps nothing, used when no caplet chain is in play.
pub fn identity_mount(spawn: SpawnFn) -> SpawnFn {
    spawn
}

impl Supervisor {
    /// Spawn `spec` with inherited stdio, install a shutdown hook that
    /// forwards SIGINT/SIGTERM (Unix) to the child's process group, and
    /// block until it exits. Returns the child's exit code.
    pub fn run_inherited(spec: &ChildSpec) -> Result<ExitOutcome, CapsuleError> {
        Self::run_inherited_with(spec, |_| {})
    }

    /// As [`Supervisor::run_inherited`], but invokes `on_spawn` with the
    /// child's PID right after spawning and before waiting — used to
    /// export `CAPSULE_APP_PID` before the child can itself recurse into
    /// a nested capsule.
    pub fn run_inherited_with(
        spec: &ChildSpec,
        on_spawn: impl FnOnce(u32),
    ) -> Result<ExitOutcome, CapsuleError> {
        Self::run_inherited_mounted(spec, on_spawn, identity_mount)
    }

    /// As [`Supervisor::run_inherited_with`], but threads the actual
    /// process creation through `mount` first — the seam a caplet chain's
    /// `mount_process` hook attaches to.
    pub fn run_inherited_mounted(
        spec: &ChildSpec,
        on_spawn: impl FnOnce(u32),
        mount: impl FnOnce(SpawnFn) -> SpawnFn,
    ) -> Result<ExitOutcome, CapsuleError> {
        let spec = spec.clone();
        let spawn: SpawnFn = Box::new(move || {
            spec.to_command(true)
                .spawn()
                .map_err(|e| CapsuleError::ChildSpawnFailure {
                    message: format!("{}: {e}", spec.program.display()),
                })
        });
        let mut child = mount(spawn)()?;

        let pid = child.id();
        tracing::debug!(pid, "spawned child (inherited stdio)");
        on_spawn(pid);

        install_shutdown_hook(pid);

        let status = child
            .wait()
            .map_err(|e| CapsuleError::InterruptedWait {
                message: e.to_string(),
            })?;

        Ok(ExitOutcome {
            code: status.code().unwrap_or(1),
        })
    }

    /// Spawn `spec` with piped stdio, forwarding each stream byte-for-byte
    /// on a dedicated thread (flush after every chunk). Used only for the
    /// documented stdio-inheritance-defect workaround.
    pub fn run_piped(spec: &ChildSpec) -> Result<ExitOutcome, CapsuleError> {
        Self::run_piped_mounted(spec, identity_mount)
    }

    /// As [`Supervisor::run_piped`], threading process creation through
    /// `mount` first.
    pub fn run_piped_mounted(
        spec: &ChildSpec,
        mount: impl FnOnce(SpawnFn) -> SpawnFn,
    ) -> Result<ExitOutcome, CapsuleError> {
        use std::io::{Read, Write};
        use std::process::Stdio as StdStdio;

        let spec = spec.clone();
        let spawn: SpawnFn = Box::new(move || {
            let mut cmd = spec.to_command(false);
            cmd.stdin(StdStdio::piped())
                .stdout(StdStdio::piped())
                .stderr(StdStdio::piped());
            cmd.spawn().map_err(|e| CapsuleError::ChildSpawnFailure {
                message: format!("{}: {e}", spec.program.display()),
            })
        });
        let mut child = mount(spawn)()?;

        let pid = child.id();
        tracing::debug!(pid, "spawned child (piped stdio, inheritance workaround)");
        install_shutdown_hook(pid);

        let mut threads = Vec::with_capacity(3);

        if let Some(mut child_stdout) = child.stdout.take() {
            threads.push(std::thread::spawn(move || {
                forward(&mut child_stdout, &mut std::io::stdout());
            }));
        }
        if let Some(mut child_stderr) = child.stderr.take() {
            threads.push(std::thread::spawn(move || {
                forward(&mut child_stderr, &mut std::io::stderr());
            }));
        }
        if let Some(mut child_stdin) = child.stdin.take() {
            threads.push(std::thread::spawn(move || {
                let mut stdin = std::io::stdin();
                let mut buf = [0u8; 4096];
                loop {
                    let n = match stdin.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    if child_stdin.write_all(&buf[..n]).is_err() {
                        break;
                    }
                    let _ = child_stdin.flush();
                }
            }));
        }

        let status = child
            .wait()
            .map_err(|e| CapsuleError::InterruptedWait {
                message: e.to_string(),
            })?;

        for t in threads {
            let _ = t.join();
        }

        Ok(ExitOutcome {
            code: status.code().unwrap_or(1),
        })
    }
}

fn forward(src: &mut impl std::io::Read, dst: &mut impl std::io::Write) {
    let mut buf = [0u8; 8192];
    loop {
        let n = match src.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        if dst.write_all(&buf[..n]).is_err() {
            break;
        }
        let _ = dst.flush();
    }
}

#[cfg(unix)]
fn install_shutdown_hook(child_pid: u32) {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let pid = Pid::from_raw(child_pid as i32);
    let result = ctrlc::set_handler(move || {
        let _ = signal::killpg(pid, Signal::SIGTERM);
        std::process::exit(130);
    });
    if let Err(e) = result {
        tracing::warn!("failed to install shutdown hook: {e}");
    }
}

#[cfg(not(unix))]
fn install_shutdown_hook(child_pid: u32) {
    let result = ctrlc::set_handler(move || {
        // Best-effort: on Windows we can't signal a process group without
        // additional job-object plumbing; terminate is handled by the
        // child inheriting the console's Ctrl+C by default. This hook
        // exists so the parent itself exits promptly rather than lingering.
        let _ = child_pid;
        std::process::exit(130);
    });
    if let Err(e) = result {
        tracing::warn!("failed to install shutdown hook: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_spec_builder() {
        let spec = ChildSpec::new("/bin/echo")
            .arg("hello")
            .args(["a", "b"])
            .env("FOO", "bar")
            .cwd("/tmp");
        assert_eq!(spec.program, Path::new("/bin/echo"));
        assert_eq!(spec.args, vec!["hello", "a", "b"]);
        assert_eq!(spec.env.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn run_inherited_reports_exit_code() {
        let spec = ChildSpec::new("true");
        let outcome = Supervisor::run_inherited(&spec).expect("spawn true");
        assert_eq!(outcome.code, 0);
    }

    #[test]
    fn run_inherited_reports_nonzero_exit_code() {
        let spec = ChildSpec::new("false");
        let outcome = Supervisor::run_inherited(&spec).expect("spawn false");
        assert_ne!(outcome.code, 0);
    }
}
