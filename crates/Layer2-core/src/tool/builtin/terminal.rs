//! Terminal Tool - shell commands through the process manager
//!
//! One mode per call, checked in this order:
//! 1. `kill_process_id` - stop a background process
//! 2. `get_output_id` - drain a background process's buffered output
//! 3. `command` - run in the foreground, or detached with `run_in_background`
//!
//! Only the command mode is gated.

use async_trait::async_trait;
use orca_foundation::{
    Error, PermissionAction, Result, Tool, ToolContext, ToolMeta, ToolResult,
};
use orca_task::{ForegroundOutcome, ProcessManager, ProcessStatus};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct TerminalInput {
    #[serde(default)]
    pub command: Option<String>,

    /// Seconds; defaults to the configured foreground timeout
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub run_in_background: bool,

    #[serde(default)]
    pub kill_process_id: Option<u32>,

    #[serde(default)]
    pub get_output_id: Option<u32>,

    /// Regex applied line by line when draining
    #[serde(default)]
    pub filter: Option<String>,
}

/// What a call asks for, after precedence is applied
#[derive(Debug, PartialEq, Eq)]
enum Mode<'a> {
    Kill(u32),
    Drain(u32),
    Run { command: &'a str, background: bool },
    Missing,
}

impl TerminalInput {
    fn mode(&self) -> Mode<'_> {
        if let Some(pid) = self.kill_process_id {
            Mode::Kill(pid)
        } else if let Some(pid) = self.get_output_id {
            Mode::Drain(pid)
        } else {
            match self.command.as_deref() {
                Some(command) if !command.trim().is_empty() => Mode::Run {
                    command,
                    background: self.run_in_background,
                },
                _ => Mode::Missing,
            }
        }
    }
}

pub struct TerminalTool {
    processes: Arc<ProcessManager>,
}

impl TerminalTool {
    pub const NAME: &'static str = "terminal";

    pub fn new(processes: Arc<ProcessManager>) -> Self {
        Self { processes }
    }

    async fn kill(&self, pid: u32) -> ToolResult {
        match self.processes.kill(pid).await {
            Ok(()) => ToolResult::success(format!("Process {} killed", pid)),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    async fn drain(&self, pid: u32, filter: Option<&str>) -> ToolResult {
        let filter = match filter.map(Regex::new).transpose() {
            Ok(filter) => filter,
            Err(e) => return ToolResult::error(format!("Invalid filter: {}", e)),
        };

        match self.processes.drain(pid, filter.as_ref()).await {
            Ok(drained) => {
                let mut text = drained.text();
                if let ProcessStatus::Exited { .. } = drained.status {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str(&format!("[process {} {}]", pid, drained.status));
                }
                ToolResult::success(text)
                    .with_metadata("running", json!(drained.status.is_running()))
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    async fn run(&self, command: &str, background: bool, timeout: Option<u64>) -> ToolResult {
        if background {
            return match self.processes.run_background(command).await {
                Ok(pid) => ToolResult::success(format!(
                    "Started background process {}. Use get_output_id={} to read its output \
                     or kill_process_id={} to stop it.",
                    pid, pid, pid
                ))
                .with_metadata("pid", json!(pid)),
                Err(e) => ToolResult::error(e.to_string()),
            };
        }

        // 0 means "no preference", not "expire immediately"
        let timeout = timeout.filter(|secs| *secs > 0).map(Duration::from_secs);
        match self.processes.run_foreground(command, timeout).await {
            Ok(outcome) => Self::foreground_result(outcome),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    fn foreground_result(outcome: ForegroundOutcome) -> ToolResult {
        let text = outcome.primary_text();
        match outcome {
            ForegroundOutcome::Exited {
                exit_code: Some(0), ..
            } => {
                let text = if text.is_empty() {
                    "(no output)".to_string()
                } else {
                    text
                };
                ToolResult::success(text).with_metadata("exit_code", json!(0))
            }
            ForegroundOutcome::Exited { exit_code, .. } => {
                let status = exit_code
                    .map(|c| format!("exit code {}", c))
                    .unwrap_or_else(|| "terminated by signal".to_string());
                ToolResult::error(format!("{}\n[{}]", text.trim_end(), status))
                    .with_metadata("exit_code", json!(exit_code))
            }
            ForegroundOutcome::TimedOut { .. } => {
                ToolResult::error(text).with_metadata("timed_out", json!(true))
            }
        }
    }
}

#[async_trait]
impl Tool for TerminalTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new(Self::NAME)
            .display_name("Terminal")
            .description(
                "Run a shell command, or manage background processes. Supplying \
                 kill_process_id or get_output_id takes precedence over command.",
            )
            .category("execute")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command to run" },
                "timeout": { "type": "integer", "description": "Foreground timeout in seconds; 0 uses the default" },
                "run_in_background": { "type": "boolean", "description": "Return immediately with a process id" },
                "kill_process_id": { "type": "integer", "description": "Kill a background process" },
                "get_output_id": { "type": "integer", "description": "Read and clear new output of a background process" },
                "filter": { "type": "string", "description": "Regex; only matching lines are returned with get_output_id" }
            }
        })
    }

    fn required_permission(&self, input: &Value) -> Option<PermissionAction> {
        let parsed: TerminalInput = serde_json::from_value(input.clone()).ok()?;
        match parsed.mode() {
            Mode::Run { command, .. } => Some(PermissionAction::Execute {
                command: command.to_string(),
            }),
            _ => None,
        }
    }

    async fn execute(&self, input: Value, _context: &dyn ToolContext) -> Result<ToolResult> {
        let parsed: TerminalInput = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(format!("Invalid input: {}", e)))?;
        debug!("terminal call: {:?}", parsed.mode());

        let result = match parsed.mode() {
            Mode::Kill(pid) => self.kill(pid).await,
            Mode::Drain(pid) => self.drain(pid, parsed.filter.as_deref()).await,
            Mode::Run {
                command,
                background,
            } => self.run(command, background, parsed.timeout).await,
            Mode::Missing => ToolResult::error(
                "Provide one of: command, get_output_id, kill_process_id",
            ),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::context::RuntimeContext;

    fn tool() -> TerminalTool {
        TerminalTool::new(Arc::new(ProcessManager::default()))
    }

    #[test]
    fn test_mode_precedence() {
        let input = TerminalInput {
            command: Some("ls".into()),
            kill_process_id: Some(1),
            get_output_id: Some(2),
            ..Default::default()
        };
        assert_eq!(input.mode(), Mode::Kill(1));

        let input = TerminalInput {
            command: Some("ls".into()),
            get_output_id: Some(2),
            ..Default::default()
        };
        assert_eq!(input.mode(), Mode::Drain(2));
        assert_eq!(TerminalInput::default().mode(), Mode::Missing);
    }

    #[test]
    fn test_only_commands_are_gated() {
        let tool = tool();
        assert_eq!(
            tool.required_permission(&json!({"command": "rm -rf build"})),
            Some(PermissionAction::Execute {
                command: "rm -rf build".into()
            })
        );
        assert_eq!(tool.required_permission(&json!({"get_output_id": 7})), None);
        assert_eq!(
            tool.required_permission(&json!({"command": "ls", "kill_process_id": 7})),
            None
        );
    }

    #[tokio::test]
    async fn test_unknown_pid_is_reported() {
        let ctx = RuntimeContext::new("s1", std::env::temp_dir());
        let result = tool()
            .execute(json!({"get_output_id": 999_999}), &ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.content().contains("999999"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_text() {
        let ctx = RuntimeContext::new("s1", std::env::temp_dir());
        let result = tool()
            .execute(json!({"command": "echo nope >&2; exit 4"}), &ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.content(), "nope\n[exit code 4]");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let ctx = RuntimeContext::new("s1", std::env::temp_dir());
        let result = tool()
            .execute(json!({"command": "sleep 5", "timeout": 1}), &ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.content().contains("timed out"));
        assert_eq!(result.metadata.get("timed_out"), Some(&json!(true)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_timeout_uses_default() {
        let ctx = RuntimeContext::new("s1", std::env::temp_dir());
        let result = tool()
            .execute(json!({"command": "echo hi", "timeout": 0}), &ctx)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.content(), "hi\n");
    }
}
