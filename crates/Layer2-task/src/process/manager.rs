//! Process manager - shell commands run by the agent
//!
//! Features:
//! - Foreground runs that block up to a timeout
//! - Background runs tracked by OS pid with drainable stdout/stderr buffers
//! - Destructive drain with optional line filter
//! - Kill and drain-to-completion as the only ways a record leaves the table

use super::buffer::OutputBuffer;
use chrono::{DateTime, Utc};
use orca_foundation::{Error, FilterMode, ProcessSettings, Result, ShellSettings};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Returned by a drain when nothing new is buffered
pub const NO_NEW_OUTPUT: &str = "No new output";

/// Lifecycle of a managed process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessStatus {
    Running,
    /// `code` is `None` when the process was ended by a signal
    Exited { code: Option<i32> },
}

impl ProcessStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Exited { code: Some(code) } => write!(f, "exited ({})", code),
            Self::Exited { code: None } => write!(f, "exited (signal)"),
        }
    }
}

/// Result of a foreground run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForegroundOutcome {
    Exited {
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
    },
    /// Deadline passed; the process was killed
    TimedOut { timeout: Duration },
}

impl ForegroundOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited { exit_code: Some(0), .. })
    }

    /// Text a caller should surface: stdout on success, stderr otherwise
    pub fn primary_text(&self) -> String {
        match self {
            Self::Exited {
                stdout,
                stderr,
                exit_code,
            } => {
                if *exit_code == Some(0) || stderr.trim().is_empty() {
                    stdout.clone()
                } else {
                    stderr.clone()
                }
            }
            Self::TimedOut { timeout } => {
                format!("Command timed out after {}s", timeout.as_secs_f64())
            }
        }
    }
}

/// Content taken from a background process by one drain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainedOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ProcessStatus,
}

impl DrainedOutput {
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Stdout then stderr, or the sentinel when both are empty
    pub fn text(&self) -> String {
        if self.is_empty() {
            return NO_NEW_OUTPUT.to_string();
        }
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str("[stderr]\n");
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Listing entry for a tracked process
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub pid: u32,
    pub command: String,
    pub status: ProcessStatus,
    /// Both pipes closed; may lag `status` when the shell left children behind
    pub output_closed: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// One background process
struct ManagedProcess {
    command: String,
    started_at: DateTime<Utc>,
    status: ProcessStatus,
    stdout: OutputBuffer,
    stderr: OutputBuffer,
    /// Both pipes hit EOF; nothing more can arrive
    readers_done: bool,
    /// Taken by `kill`
    kill_tx: Option<oneshot::Sender<()>>,
}

impl ManagedProcess {
    fn push(&mut self, stream: Stream, chunk: String) {
        match stream {
            Stream::Stdout => self.stdout.push(chunk),
            Stream::Stderr => self.stderr.push(chunk),
        }
    }
}

/// Owns every background process started by tool calls
pub struct ProcessManager {
    shell: ShellSettings,
    settings: ProcessSettings,
    working_dir: Option<PathBuf>,
    processes: Arc<RwLock<HashMap<u32, Arc<Mutex<ManagedProcess>>>>>,
}

impl ProcessManager {
    pub fn new(shell: ShellSettings, settings: ProcessSettings) -> Self {
        Self {
            shell,
            settings,
            working_dir: None,
            processes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.settings.foreground_timeout()
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.settings.filter_mode
    }

    fn command(&self, command: &str) -> Command {
        let mut cmd = Command::new(&self.shell.program);
        cmd.args(&self.shell.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    // ========================================================================
    // Foreground
    // ========================================================================

    /// Run to completion, waiting at most `timeout` (default from settings)
    pub async fn run_foreground(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<ForegroundOutcome> {
        let timeout = timeout.unwrap_or_else(|| self.default_timeout());
        debug!("Running foreground command: {}", command);

        let child = self.command(command).spawn().map_err(|e| {
            Error::Task(format!("Failed to spawn {}: {}", self.shell.program, e))
        })?;

        // dropping the future on timeout drops the child, which kills it
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code();
                if exit_code != Some(0) {
                    debug!("Foreground command exited with {:?}", exit_code);
                }
                Ok(ForegroundOutcome::Exited {
                    stdout: clean_output(&output.stdout),
                    stderr: clean_output(&output.stderr),
                    exit_code,
                })
            }
            Ok(Err(e)) => Err(Error::Task(format!("Failed to wait for process: {}", e))),
            Err(_) => {
                warn!("Foreground command timed out after {:?}: {}", timeout, command);
                Ok(ForegroundOutcome::TimedOut { timeout })
            }
        }
    }

    // ========================================================================
    // Background
    // ========================================================================

    /// Spawn detached and return the pid used as handle
    pub async fn run_background(&self, command: &str) -> Result<u32> {
        let mut child = self.command(command).spawn().map_err(|e| {
            Error::Task(format!("Failed to spawn {}: {}", self.shell.program, e))
        })?;
        let pid = child
            .id()
            .ok_or_else(|| Error::Task("Process exited before it could be tracked".to_string()))?;

        let (kill_tx, kill_rx) = oneshot::channel();
        let record = Arc::new(Mutex::new(ManagedProcess {
            command: command.to_string(),
            started_at: Utc::now(),
            status: ProcessStatus::Running,
            stdout: OutputBuffer::new(),
            stderr: OutputBuffer::new(),
            readers_done: false,
            kill_tx: Some(kill_tx),
        }));

        {
            let mut processes = self.processes.write().await;
            if processes.insert(pid, Arc::clone(&record)).is_some() {
                warn!("Replaced stale record for reused pid {}", pid);
            }
        }

        let readers: Vec<_> = [
            child
                .stdout
                .take()
                .map(|out| tokio::spawn(pump(out, Arc::clone(&record), Stream::Stdout))),
            child
                .stderr
                .take()
                .map(|err| tokio::spawn(pump(err, Arc::clone(&record), Stream::Stderr))),
        ]
        .into_iter()
        .flatten()
        .collect();

        tokio::spawn(async move {
            let code = tokio::select! {
                status = child.wait() => status.ok().and_then(|s| s.code()),
                Ok(()) = kill_rx => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill process {}: {}", pid, e);
                    }
                    None
                }
            };
            record.lock().await.status = ProcessStatus::Exited { code };
            debug!("Background process {} exited with {:?}", pid, code);

            // a child the shell left behind may still hold the pipes open
            for reader in readers {
                let _ = reader.await;
            }
            record.lock().await.readers_done = true;
        });

        info!("Started background process {}: {}", pid, command);
        Ok(pid)
    }

    /// Take and clear buffered output.
    ///
    /// A drain of an exited process with nothing left, and no pipe still
    /// open, removes its record.
    pub async fn drain(&self, pid: u32, filter: Option<&Regex>) -> Result<DrainedOutput> {
        let record = self.get(pid).await?;

        let drained = {
            let mut process = record.lock().await;
            let mode = self.settings.filter_mode;
            DrainedOutput {
                stdout: process.stdout.take(filter, mode),
                stderr: process.stderr.take(filter, mode),
                status: process.status,
            }
        };

        if drained.is_empty() && !drained.status.is_running() {
            let fully_drained = {
                let process = record.lock().await;
                process.readers_done && process.stdout.is_empty() && process.stderr.is_empty()
            };
            if fully_drained {
                self.processes.write().await.remove(&pid);
                debug!("Process {} drained to completion", pid);
            }
        }

        Ok(drained)
    }

    /// Terminate the process and stop tracking it
    pub async fn kill(&self, pid: u32) -> Result<()> {
        let record = self
            .processes
            .write()
            .await
            .remove(&pid)
            .ok_or_else(|| not_found(pid))?;

        let kill_tx = record.lock().await.kill_tx.take();
        if let Some(tx) = kill_tx {
            // an Err here means the process already exited
            let _ = tx.send(());
        }
        info!("Killed background process {}", pid);
        Ok(())
    }

    pub async fn kill_all(&self) {
        for pid in self.pids().await {
            let _ = self.kill(pid).await;
        }
    }

    pub async fn list(&self) -> Vec<ProcessSummary> {
        let records: Vec<_> = {
            let processes = self.processes.read().await;
            processes
                .iter()
                .map(|(pid, record)| (*pid, Arc::clone(record)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(records.len());
        for (pid, record) in records {
            let process = record.lock().await;
            summaries.push(ProcessSummary {
                pid,
                command: process.command.clone(),
                status: process.status,
                output_closed: process.readers_done,
                started_at: process.started_at,
            });
        }
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    pub async fn contains(&self, pid: u32) -> bool {
        self.processes.read().await.contains_key(&pid)
    }

    async fn pids(&self) -> Vec<u32> {
        self.processes.read().await.keys().copied().collect()
    }

    async fn get(&self, pid: u32) -> Result<Arc<Mutex<ManagedProcess>>> {
        self.processes
            .read()
            .await
            .get(&pid)
            .cloned()
            .ok_or_else(|| not_found(pid))
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new(ShellSettings::default(), ProcessSettings::default())
    }
}

fn not_found(pid: u32) -> Error {
    Error::NotFound(format!("No background process with id {}", pid))
}

/// Copy a pipe into the record, one chunk per line
async fn pump<R>(reader: R, record: Arc<Mutex<ManagedProcess>>, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let chunk = clean_output(&line);
                record.lock().await.push(stream, chunk);
            }
            Err(e) => {
                debug!("Stopped reading {:?}: {}", stream, e);
                break;
            }
        }
    }
}

/// Lossy UTF-8 with ANSI escapes removed; line endings are kept
fn clean_output(bytes: &[u8]) -> String {
    let (body, ending) = match bytes.iter().rposition(|b| *b != b'\n' && *b != b'\r') {
        Some(last) => bytes.split_at(last + 1),
        None => (&bytes[..0], bytes),
    };
    let mut text = String::from_utf8_lossy(&strip_ansi_escapes::strip(body)).into_owned();
    text.push_str(&String::from_utf8_lossy(ending));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output() {
        assert_eq!(clean_output(b"\x1b[31mred\x1b[0m\n"), "red\n");
        assert_eq!(clean_output(b"plain"), "plain");
        assert_eq!(clean_output(b"\n"), "\n");
    }

    #[test]
    fn test_primary_text() {
        let failed = ForegroundOutcome::Exited {
            stdout: "partial".into(),
            stderr: "boom".into(),
            exit_code: Some(2),
        };
        assert_eq!(failed.primary_text(), "boom");
        assert!(!failed.is_success());

        let ok = ForegroundOutcome::Exited {
            stdout: "done".into(),
            stderr: "warning".into(),
            exit_code: Some(0),
        };
        assert_eq!(ok.primary_text(), "done");
    }

    #[test]
    fn test_drained_text() {
        let empty = DrainedOutput {
            stdout: String::new(),
            stderr: String::new(),
            status: ProcessStatus::Running,
        };
        assert_eq!(empty.text(), NO_NEW_OUTPUT);

        let both = DrainedOutput {
            stdout: "out\n".into(),
            stderr: "err\n".into(),
            status: ProcessStatus::Running,
        };
        assert_eq!(both.text(), "out\n[stderr]\nerr\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_foreground_echo() {
        let manager = ProcessManager::default();
        let outcome = manager.run_foreground("echo hello", None).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.primary_text(), "hello\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_foreground_nonzero_surfaces_stderr() {
        let manager = ProcessManager::default();
        let outcome = manager
            .run_foreground("echo oops >&2; exit 3", None)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ForegroundOutcome::Exited {
                stdout: String::new(),
                stderr: "oops\n".into(),
                exit_code: Some(3),
            }
        );
        assert_eq!(outcome.primary_text(), "oops\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_foreground_timeout() {
        let manager = ProcessManager::default();
        let outcome = manager
            .run_foreground("sleep 5", Some(Duration::from_millis(200)))
            .await
            .unwrap();
        assert!(matches!(outcome, ForegroundOutcome::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_error() {
        let shell = ShellSettings {
            program: "/definitely/not/a/shell".into(),
            args: vec![],
        };
        let manager = ProcessManager::new(shell, ProcessSettings::default());
        assert!(manager.run_foreground("true", None).await.is_err());
        assert!(manager.run_background("true").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_pid() {
        let manager = ProcessManager::default();
        assert!(matches!(manager.drain(999_999, None).await, Err(Error::NotFound(_))));
        assert!(matches!(manager.kill(999_999).await, Err(Error::NotFound(_))));
    }
}
