//! Target process supervision
//!
//! Resolves what to execute, spawns it with the inspector enabled, relays its
//! output back to the terminal, and watches stderr for the listening
//! announcement that carries the live debug address.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};

use crate::announce::{self, DebugAddress};
use crate::error::{LaunchError, Result};

/// Environment variable the Node.js runtime reads extra options from.
/// Injected to open the inspector; cleared while resolving the npm wrapper so
/// the resolution helper itself doesn't break on `--inspect-brk`.
const RUNTIME_OPTIONS_ENV: &str = "NODE_OPTIONS";

/// Windows shell wrappers (npm and friends) carry an extra extension that a
/// bare PATH lookup misses.
#[cfg(windows)]
const WRAPPER_SUFFIX: &str = ".cmd";
#[cfg(not(windows))]
const WRAPPER_SUFFIX: &str = "";

/// Everything needed to launch one debug target. Immutable per run.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Host the inspector is asked to bind
    pub host: String,
    /// Port the inspector is asked to bind (0 = ephemeral)
    pub port: u16,
    /// Script path or command name to run
    pub target: String,
    /// Arguments passed through to the target
    pub args: Vec<String>,
    /// Executable used to run a resolved script path
    pub runtime: String,
    /// Deadline for the listening announcement
    pub announce_timeout: Duration,
}

impl LaunchRequest {
    pub fn new(host: impl Into<String>, port: u16, target: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            target: target.into(),
            args: Vec::new(),
            runtime: "node".to_string(),
            announce_timeout: crate::port::DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

/// Receives relayed child output, one formatted line at a time.
pub trait OutputSink: Send + Sync + 'static {
    fn line(&self, line: &str);
}

/// Sink that forwards to stdout. The CLI installs its own styled sink.
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&self, line: &str) {
        println!("{line}");
    }
}

/// Shared slot for the single tracked child process.
///
/// Relay tasks kill through it when the disconnect trailer appears; the
/// orchestrator kills through it on every exit path. Taking the child out of
/// the slot makes kill idempotent.
#[derive(Clone, Default)]
pub struct ChildHandle {
    slot: Arc<Mutex<Option<Child>>>,
}

impl ChildHandle {
    pub fn new() -> Self {
        Self::default()
    }

    async fn track(&self, child: Child) {
        *self.slot.lock().await = Some(child);
    }

    pub async fn is_tracking(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Kill the tracked child. No-op if nothing is tracked.
    pub async fn kill(&self) {
        if let Some(mut child) = self.slot.lock().await.take() {
            if let Err(e) = child.kill().await {
                tracing::debug!(error = %e, "failed to kill child (may have exited)");
            }
        }
    }

    /// Wait for the tracked child to exit, polling so a concurrent `kill`
    /// through the same handle is never blocked out. Returns the exit code if
    /// the child exited on its own, `None` if it was killed or never tracked.
    pub async fn wait(&self) -> Option<i32> {
        let mut poll = tokio::time::interval(Duration::from_millis(150));
        loop {
            poll.tick().await;
            let mut slot = self.slot.lock().await;
            match slot.as_mut() {
                None => return None,
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        slot.take();
                        return status.code();
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "failed to poll child status");
                        slot.take();
                        return None;
                    }
                },
            }
        }
    }
}

/// Spawns the resolved target and scans its output for the debug address.
pub struct Supervisor {
    sink: Arc<dyn OutputSink>,
}

impl Supervisor {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    /// Launch the target and wait for its inspector to announce itself.
    ///
    /// The spawned child is stored in `handle` before this returns, so the
    /// caller can kill it even if the announcement never arrives. Output relay
    /// keeps running in background tasks for the life of the child.
    pub async fn launch(
        &self,
        request: &LaunchRequest,
        handle: &ChildHandle,
    ) -> Result<DebugAddress> {
        let (program, args) = resolve_target(request)?;

        tracing::debug!(program = %program.display(), ?args, "spawning target");

        let mut child = Command::new(&program)
            .args(&args)
            .env(
                RUNTIME_OPTIONS_ENV,
                format!("--inspect-brk={}:{}", request.host, request.port),
            )
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(LaunchError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LaunchError::Spawn(std::io::Error::other("stdout was not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LaunchError::Spawn(std::io::Error::other("stderr was not piped")))?;
        handle.track(child).await;

        let (address_tx, address_rx) = oneshot::channel();
        self.spawn_relay(stdout, handle.clone(), None);
        self.spawn_relay(stderr, handle.clone(), Some(address_tx));

        match tokio::time::timeout(request.announce_timeout, address_rx).await {
            Ok(Ok(address)) => {
                tracing::debug!(%address, "inspector is listening");
                Ok(address)
            }
            // Sender dropped: stderr closed without ever announcing.
            Ok(Err(_)) => Err(LaunchError::EarlyExit),
            Err(_) => Err(LaunchError::AnnounceTimeout {
                timeout: request.announce_timeout,
            }),
        }
    }

    /// Relay one stream line-by-line. Lines are prefixed with `< `, blank
    /// lines suppressed, per-stream order preserved. If `address_tx` is set
    /// the stream is also scanned for the listening announcement until the
    /// first match.
    fn spawn_relay(
        &self,
        stream: impl AsyncRead + Unpin + Send + 'static,
        handle: ChildHandle,
        address_tx: Option<oneshot::Sender<DebugAddress>>,
    ) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let mut address_tx = address_tx;
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.is_empty() {
                    sink.line(&format!("< {line}"));
                }
                if let Some(tx) = address_tx.take() {
                    match announce::parse_listening(&line) {
                        Some(address) => {
                            let _ = tx.send(address);
                        }
                        None => address_tx = Some(tx),
                    }
                }
                if announce::is_disconnect_trailer(&line) {
                    // The program is done and only the debugger keeps it
                    // alive; reap it.
                    tracing::debug!("debugger disconnected, killing child");
                    handle.kill().await;
                    break;
                }
            }
        });
    }
}

/// Resolve the launch target to a concrete program and argument list.
///
/// Order: a script file relative to the working directory (as given or with
/// `.js` appended) runs under the configured runtime; the npm wrapper is
/// unwrapped to its JS entry point; anything else is looked up on PATH, once
/// as given and once with the platform wrapper suffix.
fn resolve_target(request: &LaunchRequest) -> Result<(PathBuf, Vec<String>)> {
    if let Some(script) = resolve_script(&request.target) {
        let mut args = Vec::with_capacity(request.args.len() + 1);
        args.push(script.to_string_lossy().into_owned());
        args.extend(request.args.iter().cloned());
        return Ok((PathBuf::from(&request.runtime), args));
    }

    if request.target == "npm"
        && let Some(npm_cli) = resolve_npm_wrapper()
    {
        let mut args = Vec::with_capacity(request.args.len() + 1);
        args.push(npm_cli.to_string_lossy().into_owned());
        args.extend(request.args.iter().cloned());
        return Ok((PathBuf::from(&request.runtime), args));
    }

    let program = which::which(&request.target)
        .or_else(|_| {
            if WRAPPER_SUFFIX.is_empty() {
                Err(which::Error::CannotFindBinaryPath)
            } else {
                which::which(format!("{}{}", request.target, WRAPPER_SUFFIX))
            }
        })
        .map_err(|_| LaunchError::TargetNotFound(request.target.clone()))?;

    Ok((program, request.args.clone()))
}

/// Try the target as a script path, with the original's `.js` fallback.
fn resolve_script(target: &str) -> Option<PathBuf> {
    for candidate in [PathBuf::from(target), PathBuf::from(format!("{target}.js"))] {
        if candidate.is_file() {
            return std::fs::canonicalize(&candidate).ok().or(Some(candidate));
        }
    }
    None
}

/// Locate the real npm entry point behind the shell wrapper so it can run
/// under the inspected runtime. `NODE_OPTIONS` is cleared for the helper
/// invocation; the wrapper would otherwise inherit `--inspect-brk` itself.
fn resolve_npm_wrapper() -> Option<PathBuf> {
    let output = std::process::Command::new("npm")
        .args(["prefix", "-g"])
        .env_remove(RUNTIME_OPTIONS_ENV)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let prefix = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let npm_cli = Path::new(&prefix).join("node_modules/npm/bin/npm-cli.js");
    npm_cli.is_file().then_some(npm_cli)
}
