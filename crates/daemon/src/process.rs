// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync daemon process handle.
//!
//! A launched daemon is owned by a wrapper thread that pumps its output
//! into the log and waits for it to exit, then reports an [`ExitKind`].
//! Termination does not rely on the child handle alone: processes are
//! discovered by binary name, so daemons left behind by an earlier
//! supervisor, or running behind an elevated shell, are stopped too.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use sysinfo::{ProcessStatus, System};

use crate::error::{Error, Result};
use crate::settings::{DaemonSettings, LogLevel};

/// Exit code the daemon uses after being killed with SIGKILL.
const EXIT_KILLED: i32 = 137;
/// Exit codes asking the supervisor to start the daemon again.
const EXIT_RESTART_CODES: [i32; 2] = [1, 3];

/// Output log is trimmed at launch once it grows beyond this size.
const OUTPUT_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Lines kept when the output log is trimmed.
const OUTPUT_LOG_KEEP_LINES: usize = 2000;

/// How a daemon exit should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Normal,
    RestartRequested,
    Crashed(i32),
}

/// Classify an exit code. Exits after a requested stop are always normal.
pub fn classify(code: i32, stop_requested: bool) -> ExitKind {
    if stop_requested || code == 0 || code == EXIT_KILLED {
        ExitKind::Normal
    } else if EXIT_RESTART_CODES.contains(&code) {
        ExitKind::RestartRequested
    } else {
        ExitKind::Crashed(code)
    }
}

/// Exit code of a finished process; death by signal maps to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

/// Invocations of the daemon binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Long-running sync service.
    Serve,
    /// One-shot: drop the index database.
    ResetDatabase,
    /// One-shot: forget delta indexes.
    ResetDeltas,
    /// One-shot: print the local device ID.
    DeviceId,
    /// One-shot: create a default `config.xml`.
    Generate,
}

impl DaemonCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DaemonCommand::Serve => "serve",
            DaemonCommand::ResetDatabase => "reset-database",
            DaemonCommand::ResetDeltas => "reset-deltas",
            DaemonCommand::DeviceId => "device-id",
            DaemonCommand::Generate => "generate",
        }
    }

    fn args(&self, home: &Path, log_level: LogLevel) -> Vec<String> {
        let home = home.to_string_lossy().into_owned();
        let mut args = match self {
            DaemonCommand::Generate => vec!["generate".to_string()],
            _ => vec!["serve".to_string()],
        };
        args.push("--home".to_string());
        args.push(home);
        match self {
            DaemonCommand::Serve => {
                args.push("--no-browser".to_string());
                let flags = if log_level == LogLevel::Debug { 16 } else { 0 };
                args.push(format!("--logflags={flags}"));
                if log_level != LogLevel::Info {
                    args.push("--verbose".to_string());
                }
            }
            DaemonCommand::ResetDatabase => args.push("--reset-database".to_string()),
            DaemonCommand::ResetDeltas => args.push("--reset-deltas".to_string()),
            DaemonCommand::DeviceId => args.push("--device-id".to_string()),
            DaemonCommand::Generate => {}
        }
        args
    }
}

/// Everything needed to start one daemon invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    pub binary: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Elevated shell reading the launch script on stdin.
    pub elevate: Option<Vec<String>>,
    /// File receiving a copy of the daemon's output.
    pub output_log: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(settings: &DaemonSettings, command: DaemonCommand) -> Self {
        let mut env = vec![
            ("STNORESTART".to_string(), "1".to_string()),
            ("STNOUPGRADE".to_string(), "1".to_string()),
        ];
        if !settings.trace.is_empty() {
            env.push(("STTRACE".to_string(), settings.trace.join(",")));
        }
        if !settings.http_proxy.is_empty() {
            env.push(("http_proxy".to_string(), settings.http_proxy.clone()));
        }
        if !settings.https_proxy.is_empty() {
            env.push(("https_proxy".to_string(), settings.https_proxy.clone()));
        }
        env.extend(
            settings
                .extra_env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let elevate = (settings.use_root && !settings.elevate_command.is_empty())
            .then(|| settings.elevate_command.clone());

        Self {
            binary: settings.binary.clone(),
            args: command.args(&settings.home_dir(), settings.log_level),
            env,
            elevate,
            output_log: None,
        }
    }

    pub fn with_output_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_log = Some(path.into());
        self
    }

    /// Human-readable command line, for logs and errors.
    pub fn display(&self) -> String {
        let mut parts = vec![self.binary.to_string_lossy().into_owned()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Script fed to the elevated shell: one export per variable, then exec.
    pub fn elevated_script(&self) -> String {
        let mut script = String::new();
        for (key, value) in &self.env {
            script.push_str(&format!("export {}={}\n", key, shell_quote(value)));
        }
        script.push_str("exec ");
        script.push_str(&shell_quote(&self.binary.to_string_lossy()));
        for arg in &self.args {
            script.push(' ');
            script.push_str(&shell_quote(arg));
        }
        script.push('\n');
        script
    }

    fn spawn_child(&self) -> Result<Child> {
        let mut command = match &self.elevate {
            Some(shell) => {
                let (program, rest) = shell
                    .split_first()
                    .ok_or_else(|| Error::NotFound("elevate command".to_string()))?;
                let mut c = Command::new(program);
                c.args(rest).stdin(Stdio::piped());
                c
            }
            None => {
                let mut c = Command::new(&self.binary);
                c.args(&self.args)
                    .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .stdin(Stdio::null());
                c
            }
        };
        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Launch {
                binary: self.binary.to_string_lossy().into_owned(),
                source,
            })?;
        if self.elevate.is_some() {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(self.elevated_script().as_bytes())?;
            }
        }
        Ok(child)
    }
}

/// Single-quote a value for `sh`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Timing of the termination protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillPolicy {
    /// Pause after each round of signals.
    pub interrupt_wait: Duration,
    /// Grace period before escalating to SIGKILL.
    pub kill_wait: Duration,
    /// Scan-and-escalate passes before giving up.
    pub passes: u32,
    /// Upper bound on waiting for the wrapper thread after termination.
    pub join_timeout: Duration,
}

impl Default for KillPolicy {
    fn default() -> Self {
        Self {
            interrupt_wait: Duration::from_secs(1),
            kill_wait: Duration::from_secs(3),
            passes: 2,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Called once from the wrapper thread when the daemon exits.
pub type ExitCallback = Box<dyn FnOnce(ExitKind) + Send>;

/// A running daemon and the thread that owns it.
pub struct DaemonProcess {
    pid: u32,
    target: DaemonMatch,
    elevate: Option<Vec<String>>,
    policy: KillPolicy,
    stop_requested: Arc<AtomicBool>,
    wrapper: Option<JoinHandle<()>>,
}

impl DaemonProcess {
    pub fn spawn(spec: &LaunchSpec, policy: KillPolicy, on_exit: ExitCallback) -> Result<Self> {
        if let Some(log) = &spec.output_log {
            trim_output_log(log, OUTPUT_LOG_MAX_BYTES, OUTPUT_LOG_KEEP_LINES);
        }
        let mut child = spec.spawn_child()?;
        let pid = child.id();
        tracing::info!("launched daemon pid {}: {}", pid, spec.display());

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stop_requested = Arc::new(AtomicBool::new(false));
        let stopping = Arc::clone(&stop_requested);
        let log = spec.output_log.clone();

        let wrapper = thread::Builder::new()
            .name("daemon-wrapper".to_string())
            .spawn(move || {
                let err_log = log.clone();
                let err_pump = stderr.and_then(|err| {
                    thread::Builder::new()
                        .name("daemon-stderr".to_string())
                        .spawn(move || pump_output(err, OutputStream::Stderr, err_log.as_deref()))
                        .ok()
                });
                if let Some(out) = stdout {
                    pump_output(out, OutputStream::Stdout, log.as_deref());
                }
                let code = match child.wait() {
                    Ok(status) => exit_code(status),
                    Err(e) => {
                        tracing::warn!("failed to wait for daemon: {}", e);
                        -1
                    }
                };
                if let Some(handle) = err_pump {
                    let _ = handle.join();
                }
                let kind = classify(code, stopping.load(Ordering::SeqCst));
                tracing::info!("daemon pid {} exited with code {} ({:?})", pid, code, kind);
                on_exit(kind);
            })?;

        Ok(Self {
            pid,
            target: DaemonMatch::for_spec(spec),
            elevate: spec.elevate.clone(),
            policy,
            stop_requested,
            wrapper: Some(wrapper),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Stop the daemon and wait for its wrapper thread. Idempotent.
    pub fn kill(&mut self) {
        let Some(wrapper) = self.wrapper.take() else {
            return;
        };
        self.stop_requested.store(true, Ordering::SeqCst);
        let own_pid = (self.elevate.is_none() && !wrapper.is_finished()).then_some(self.pid);
        terminate(
            &self.target,
            own_pid,
            self.elevate.as_deref(),
            &self.policy,
        );

        let deadline = Instant::now() + self.policy.join_timeout;
        while !wrapper.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        if wrapper.is_finished() {
            if wrapper.join().is_err() {
                tracing::warn!("daemon wrapper thread panicked");
            }
        } else {
            tracing::warn!("daemon wrapper thread did not finish, detaching");
        }
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

fn binary_name(binary: &Path) -> String {
    binary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| binary.to_string_lossy().into_owned())
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

fn pump_output(reader: impl Read, stream: OutputStream, log: Option<&Path>) {
    let mut file = log.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| tracing::warn!("cannot open {}: {}", path.display(), e))
            .ok()
    });
    for chunk in BufReader::new(reader).split(b'\n') {
        let Ok(bytes) = chunk else {
            break;
        };
        let line = String::from_utf8_lossy(&bytes);
        let line = line.trim_end_matches('\r');
        match stream {
            OutputStream::Stdout => tracing::info!(target: "syncthing", "{}", line),
            OutputStream::Stderr => tracing::warn!(target: "syncthing", "{}", line),
        }
        if let Some(f) = file.as_mut() {
            let _ = writeln!(f, "{line}");
        }
    }
}

/// Keep only the last `keep_lines` lines once the file exceeds `max_bytes`.
pub fn trim_output_log(path: &Path, max_bytes: u64, keep_lines: usize) {
    let Ok(meta) = fs::metadata(path) else {
        return;
    };
    if meta.len() <= max_bytes {
        return;
    }
    let Ok(bytes) = fs::read(path) else {
        return;
    };
    let content = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(keep_lines);
    let mut trimmed = lines[start..].join("\n");
    trimmed.push('\n');
    match fs::write(path, trimmed) {
        Ok(()) => tracing::debug!("trimmed {} to {} lines", path.display(), keep_lines),
        Err(e) => tracing::warn!("failed to trim {}: {}", path.display(), e),
    }
}

/// Which processes count as this supervisor's daemon.
///
/// A process matches when its name is the daemon binary's, it runs as the
/// daemon's user, and its command line names the same `--home`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonMatch {
    pub binary_name: String,
    /// `None` matches any home.
    pub home: Option<String>,
    /// `None` matches any user.
    pub uid: Option<u32>,
}

impl DaemonMatch {
    /// Processes started from `spec`. Elevated daemons run as root.
    pub fn for_spec(spec: &LaunchSpec) -> Self {
        let home = spec
            .args
            .windows(2)
            .find(|pair| pair[0] == "--home")
            .map(|pair| pair[1].clone());
        let uid = if spec.elevate.is_some() {
            0
        } else {
            nix::unistd::getuid().as_raw()
        };
        Self {
            binary_name: binary_name(&spec.binary),
            home,
            uid: Some(uid),
        }
    }

    fn matches(&self, process: &sysinfo::Process) -> bool {
        let named = comm_matches(process.name(), &self.binary_name)
            || process
                .exe()
                .and_then(|exe| exe.file_name())
                .is_some_and(|name| name == self.binary_name.as_str());
        if !named {
            return false;
        }
        if let Some(uid) = self.uid {
            if process.user_id().map(|u| **u) != Some(uid) {
                return false;
            }
        }
        match &self.home {
            Some(home) => cmd_names_home(process.cmd(), home),
            None => true,
        }
    }
}

/// True when `cmd` passes `home` as `--home <dir>` or `--home=<dir>`.
fn cmd_names_home(cmd: &[String], home: &str) -> bool {
    let home = home.trim_end_matches('/');
    cmd.iter().enumerate().any(|(i, arg)| match arg.strip_prefix("--home") {
        Some("") => cmd
            .get(i + 1)
            .is_some_and(|next| next.trim_end_matches('/') == home),
        Some(rest) => rest
            .strip_prefix('=')
            .is_some_and(|value| value.trim_end_matches('/') == home),
        None => false,
    })
}

/// Find live processes matching `target`.
///
/// `also` is included when it is alive, whatever it looks like.
pub fn find_daemon_pids(target: &DaemonMatch, also: Option<u32>) -> Vec<u32> {
    let own = std::process::id();
    let mut system = System::new();
    system.refresh_processes();
    let mut pids: Vec<u32> = system
        .processes()
        .iter()
        .filter(|(pid, process)| {
            pid.as_u32() != own
                && process.status() != ProcessStatus::Zombie
                && target.matches(process)
        })
        .map(|(pid, _)| pid.as_u32())
        .collect();
    if let Some(extra) = also {
        let alive = system
            .process(sysinfo::Pid::from_u32(extra))
            .is_some_and(|p| p.status() != ProcessStatus::Zombie);
        if alive && !pids.contains(&extra) {
            pids.push(extra);
        }
    }
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// Kernel process names are truncated to 15 bytes.
fn comm_matches(comm: &str, binary_name: &str) -> bool {
    const COMM_LEN: usize = 15;
    if binary_name.len() > COMM_LEN {
        binary_name.is_char_boundary(COMM_LEN) && comm == &binary_name[..COMM_LEN]
    } else {
        comm == binary_name
    }
}

fn send_signal(pids: &[u32], sig: Signal, elevate: Option<&[String]>) {
    if pids.is_empty() {
        return;
    }
    tracing::info!("sending {} to {:?}", sig, pids);
    match elevate {
        Some(shell) => {
            let name = sig.as_str().trim_start_matches("SIG");
            let list: Vec<String> = pids.iter().map(u32::to_string).collect();
            let script = format!("kill -s {} {}\n", name, list.join(" "));
            if let Err(e) = run_script(shell, &script) {
                tracing::warn!("elevated kill failed: {}", e);
            }
        }
        None => {
            for &pid in pids {
                let Ok(raw) = i32::try_from(pid) else {
                    continue;
                };
                match signal::kill(Pid::from_raw(raw), sig) {
                    Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                    Err(e) => tracing::warn!("failed to signal pid {}: {}", pid, e),
                }
            }
        }
    }
}

fn run_script(shell: &[String], script: &str) -> Result<()> {
    let (program, rest) = shell
        .split_first()
        .ok_or_else(|| Error::NotFound("elevate command".to_string()))?;
    let mut child = Command::new(program)
        .args(rest)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(script.as_bytes())?;
    }
    child.wait()?;
    Ok(())
}

/// Stop every daemon process: SIGINT, then SIGKILL for survivors.
///
/// Returns true when no matching process remains.
pub fn terminate(
    target: &DaemonMatch,
    own_pid: Option<u32>,
    elevate: Option<&[String]>,
    policy: &KillPolicy,
) -> bool {
    let discover = || find_daemon_pids(target, own_pid);
    for _ in 0..policy.passes {
        let pids = discover();
        if pids.is_empty() {
            return true;
        }
        send_signal(&pids, Signal::SIGINT, elevate);
        thread::sleep(policy.interrupt_wait);

        if discover().is_empty() {
            return true;
        }
        thread::sleep(policy.kill_wait);
        let survivors = discover();
        if survivors.is_empty() {
            return true;
        }
        send_signal(&survivors, Signal::SIGKILL, elevate);
        thread::sleep(policy.interrupt_wait);
    }
    let survivors = discover();
    if survivors.is_empty() {
        return true;
    }
    tracing::error!(
        "failed to stop {}: pids {:?} still running",
        target.binary_name,
        survivors
    );
    false
}

/// Captured output of a one-shot invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run a one-shot daemon command, killing it after `timeout`.
pub fn run_once(spec: &LaunchSpec, timeout: Duration) -> Result<CommandOutput> {
    let mut child = spec.spawn_child()?;
    let out_reader = child.stdout.take().map(spawn_collector);
    let err_reader = child.stderr.take().map(spawn_collector);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            match child.kill() {
                Ok(()) => {
                    let _ = child.wait();
                }
                Err(e) => tracing::warn!("failed to kill timed out command: {}", e),
            }
            return Err(Error::Timeout {
                command: spec.display(),
                secs: timeout.as_secs(),
            });
        }
        thread::sleep(Duration::from_millis(50));
    };

    let output = CommandOutput {
        stdout: collect(out_reader),
        stderr: collect(err_reader),
    };
    let code = exit_code(status);
    if code != 0 {
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        return Err(Error::CommandFailed {
            command: spec.display(),
            code,
            output: detail,
        });
    }
    Ok(output)
}

fn spawn_collector(mut reader: impl Read + Send + 'static) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
