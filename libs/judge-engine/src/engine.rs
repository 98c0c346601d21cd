/// Execution Engine - process lifecycle for build and run
///
/// **Core Responsibility:**
/// Spawn a child process in the workspace, enforce a hard wall-clock
/// timeout, capture stdout/stderr incrementally and measure elapsed time.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (local child processes)
/// - Engine does NOT compare outputs or classify failures
/// - Engine returns raw outcomes for the Evaluator to judge
///
/// Each child is the leader of its own process group. On timeout, and
/// again after a normal exit, the whole group is killed so nothing the
/// submission forked can outlive the test case or keep the pipes open.
use crate::strategy::{Artifact, CommandSpec, LanguageStrategy};
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use judge_common::config::JudgeConfig;
use regex::Regex;
use std::path::Path;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// How long to wait for the capture tasks once the process group is gone.
const CAPTURE_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK_BYTES: usize = 8192;

/// Bytes read from one pipe so far, shared with the reader task so a
/// capture cut short by the grace period still keeps what arrived.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

type SharedCapture = Arc<Mutex<Captured>>;

/// Raw outcome of one child process, before any judgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    /// Measured wall time from spawn to exit or forced termination
    pub elapsed_ms: u64,
    pub timed_out: bool,
}

impl RawExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Human-readable exit description for fallback error messages.
    pub fn exit_description(&self) -> String {
        match (self.exit_code, self.signal) {
            (Some(code), _) => format!("Process exited with code {}", code),
            (None, Some(signal)) => format!("Process terminated by signal {}", signal),
            (None, None) => "Process terminated abnormally".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    /// Filtered diagnostics shown to the user
    pub message: String,
    /// Everything the toolchain printed
    pub full_error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(Artifact),
    Failed(CompileFailure),
}

/// Run `spec` inside `cwd` under a hard wall-clock limit.
///
/// Returns `Err` only for harness failures (spawn/wait errors). A program
/// that crashes or times out is a normal `Ok` outcome.
pub async fn run_process(
    spec: &CommandSpec,
    cwd: &Path,
    timeout: Duration,
    max_output_bytes: usize,
) -> Result<RawExecutionOutcome> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for key in &spec.env_remove {
        command.env_remove(key);
    }
    for (key, value) in &spec.env {
        command.env(key, value);
    }

    command.process_group(0);

    let start_time = Instant::now();

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn '{}'", spec.program))?;
    let pid = child.id();

    let stdout = child.stdout.take().context("Child stdout was not captured")?;
    let stderr = child.stderr.take().context("Child stderr was not captured")?;
    let stdout_buf = SharedCapture::default();
    let stderr_buf = SharedCapture::default();
    let stdout_task = tokio::spawn(capture_stream(stdout, max_output_bytes, Arc::clone(&stdout_buf)));
    let stderr_task = tokio::spawn(capture_stream(stderr, max_output_bytes, Arc::clone(&stderr_buf)));

    let (status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status) => (Some(status.context("Failed to wait for child process")?), false),
        Err(_) => {
            debug!(pid = ?pid, timeout_ms = timeout.as_millis() as u64, "Timed out, killing process group");
            kill_process_group(pid);
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "start_kill after group kill");
            }
            if let Err(e) = child.wait().await {
                warn!(error = %e, "Failed to reap timed-out child");
            }
            (None, true)
        }
    };

    let elapsed_ms = start_time.elapsed().as_millis() as u64;

    // Stragglers left in the group would hold the capture pipes open. The
    // leader is already reaped, but its pgid stays reserved while any member
    // lives; an empty group whose pid was recycled as a new group leader in
    // between is an accepted race.
    kill_process_group(pid);

    let stdout = collect_capture(stdout_task, &stdout_buf, "stdout").await;
    let mut stderr = collect_capture(stderr_task, &stderr_buf, "stderr").await;

    let (exit_code, signal) = match status {
        Some(status) => (status.code(), exit_signal(&status)),
        None => (None, None),
    };

    if let Some(signal) = signal {
        stderr.push_str(&format!(
            "\n[Process killed by signal {}: {}]",
            signal,
            signal_description(signal)
        ));
    }

    Ok(RawExecutionOutcome {
        stdout,
        stderr,
        exit_code,
        signal,
        elapsed_ms,
        timed_out,
    })
}

/// Build stage: invoke the toolchain when the language has one.
#[instrument(skip_all, fields(language = %strategy.language()))]
pub async fn build(
    strategy: &dyn LanguageStrategy,
    workspace: &Workspace,
    source: &Path,
    config: &JudgeConfig,
) -> Result<BuildOutcome> {
    let artifact = strategy.artifact(workspace.path(), source);

    let command = match strategy.build_command(workspace.path(), source) {
        Some(command) => command,
        None => {
            debug!("No build step, running source directly");
            return Ok(BuildOutcome::Built(artifact));
        }
    };

    debug!(program = %command.program, args = ?command.args, "Starting build");

    let outcome = run_process(
        &command,
        workspace.path(),
        Duration::from_millis(config.build_timeout_ms),
        config.max_output_bytes,
    )
    .await
    .with_context(|| format!("Failed to run {} toolchain", strategy.language()))?;

    let full_error = combine_output(&outcome.stdout, &outcome.stderr);

    if outcome.timed_out {
        warn!(build_timeout_ms = config.build_timeout_ms, "Build timed out");
        return Ok(BuildOutcome::Failed(CompileFailure {
            message: format!("Compilation timed out after {} ms", config.build_timeout_ms),
            full_error,
        }));
    }

    if !outcome.succeeded() {
        let message = strategy
            .diagnostic_pattern()
            .and_then(|pattern| filter_diagnostics(&full_error, pattern))
            .unwrap_or_else(|| {
                if full_error.is_empty() {
                    format!("Compilation failed: {}", outcome.exit_description())
                } else {
                    full_error.clone()
                }
            });

        warn!(
            compilation_time_ms = outcome.elapsed_ms,
            error_preview = message.lines().next().unwrap_or(""),
            "Compilation failed"
        );
        return Ok(BuildOutcome::Failed(CompileFailure { message, full_error }));
    }

    if !artifact.path().exists() {
        warn!(artifact = %artifact.path().display(), "Build succeeded without producing an artifact");
        return Ok(BuildOutcome::Failed(CompileFailure {
            message: "Compilation produced no runnable artifact".to_string(),
            full_error,
        }));
    }

    info!(compilation_time_ms = outcome.elapsed_ms, "Compilation succeeded");
    Ok(BuildOutcome::Built(artifact))
}

/// Run the built artifact once with the given arguments.
#[instrument(skip_all, fields(language = %strategy.language(), args = args.len()))]
pub async fn run_artifact(
    strategy: &dyn LanguageStrategy,
    artifact: &Artifact,
    args: &[String],
    workspace: &Path,
    config: &JudgeConfig,
) -> Result<RawExecutionOutcome> {
    let command = strategy.run_command(artifact, args);
    let outcome = run_process(
        &command,
        workspace,
        Duration::from_millis(config.timeout_ms),
        config.max_output_bytes,
    )
    .await?;

    if outcome.timed_out {
        warn!(timeout_ms = config.timeout_ms, "Test execution timed out");
    } else if !outcome.succeeded() {
        warn!(
            execution_time_ms = outcome.elapsed_ms,
            exit_code = ?outcome.exit_code,
            signal = ?outcome.signal,
            "Test execution had runtime error"
        );
    } else {
        debug!(execution_time_ms = outcome.elapsed_ms, "Test execution completed successfully");
    }

    Ok(outcome)
}

/// Keep only lines matching the toolchain's diagnostic pattern.
pub fn filter_diagnostics(output: &str, pattern: &str) -> Option<String> {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid diagnostic pattern, using raw output");
            return None;
        }
    };

    let lines: Vec<&str> = output.lines().filter(|line| regex.is_match(line)).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn combine_output(stdout: &str, stderr: &str) -> String {
    [stdout.trim(), stderr.trim()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a pipe to EOF into `sink`, keeping at most `limit` bytes and
/// discarding the rest.
async fn capture_stream<R>(mut reader: R, limit: usize, sink: SharedCapture)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_CHUNK_BYTES];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let mut captured = sink.lock().unwrap_or_else(PoisonError::into_inner);
                let room = limit.saturating_sub(captured.bytes.len());
                if n > room {
                    captured.truncated = true;
                }
                captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                warn!(error = %e, "Error reading child output");
                break;
            }
        }
    }
}

/// Wait briefly for the reader to hit EOF, then take whatever it captured.
/// A pipe held open by a process outside the group (e.g. `setsid`) only
/// loses bytes written after the grace period.
async fn collect_capture(mut task: JoinHandle<()>, sink: &SharedCapture, stream: &str) -> String {
    match tokio::time::timeout(CAPTURE_GRACE, &mut task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(stream, error = %e, "Output capture task failed"),
        Err(_) => {
            warn!(stream, "Output pipe still open after process exit, keeping partial capture");
            task.abort();
        }
    }

    let captured = sink.lock().unwrap_or_else(PoisonError::into_inner);
    if captured.truncated {
        warn!(stream, captured_bytes = captured.bytes.len(), "Output exceeded capture limit, truncated");
    }
    String::from_utf8_lossy(&captured.bytes).into_owned()
}

fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) {
        // SAFETY: plain syscall; a negative pid addresses the group whose
        // leader we spawned. ESRCH just means the group is already gone.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

fn exit_signal(status: &ExitStatus) -> Option<i32> {
    status.signal()
}

pub fn signal_description(signal: i32) -> &'static str {
    match signal {
        libc::SIGILL => "illegal instruction",
        libc::SIGABRT => "aborted",
        libc::SIGBUS => "bus error",
        libc::SIGFPE => "floating point exception",
        libc::SIGKILL => "killed",
        libc::SIGSEGV => "segmentation fault",
        libc::SIGPIPE => "broken pipe",
        libc::SIGTERM => "terminated",
        _ => "unknown signal",
    }
}
