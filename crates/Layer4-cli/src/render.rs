//! Terminal output

use orca_agent::{AgentEvent, InterruptRequest, TurnOutcome};
use orca_task::{ProcessSummary, TaskRecord};

pub fn event(event: &AgentEvent) {
    match event {
        AgentEvent::Text(text) => println!("{}", text),
        AgentEvent::ToolStart { tool_name, .. } => println!("[{}] running...", tool_name),
        AgentEvent::ToolComplete {
            tool_name,
            result,
            success,
            ..
        } => {
            let status = if *success { "✓" } else { "✗" };
            println!("[{}] {} {}", tool_name, status, truncate(result, 100));
        }
        AgentEvent::Suspended(_) | AgentEvent::Done { .. } => {}
    }
}

/// Text already went out as events; only the non-text endings print here
pub fn outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Completed { .. } | TurnOutcome::Suspended(_) => {}
        TurnOutcome::Finished { result, summary } => {
            if let Some(summary) = summary {
                println!("Summary: {}", summary);
            }
            println!("{}", result);
        }
        TurnOutcome::Exhausted { last_output } => {
            println!("[stopped: iteration limit reached]");
            println!("{}", last_output);
        }
    }
}

pub fn review_request(request: &InterruptRequest) {
    println!();
    println!("Review needed: {}", request.description);
    println!("  tool:      {}", request.tool_name);
    println!(
        "  arguments: {}",
        serde_json::to_string_pretty(&request.arguments)
            .unwrap_or_else(|_| request.arguments.to_string())
    );
    let choices: Vec<String> = request
        .allowed_decisions
        .iter()
        .map(|kind| match kind.as_str() {
            "approve" => "approve | always".to_string(),
            "reject" => "reject <reason>".to_string(),
            "edit" => "edit <json>".to_string(),
            other => other.to_string(),
        })
        .collect();
    println!("  answer:    {}", choices.join(" | "));
}

pub fn processes(list: &[ProcessSummary]) {
    if list.is_empty() {
        println!("No background processes.");
        return;
    }
    println!("{:<8} {:<16} {:<20} COMMAND", "PID", "STATUS", "STARTED");
    for process in list {
        println!(
            "{:<8} {:<16} {:<20} {}",
            process.pid,
            process.status.to_string(),
            process.started_at.format("%Y-%m-%d %H:%M:%S"),
            truncate(&process.command, 60)
        );
    }
}

pub fn tasks(list: &[TaskRecord]) {
    if list.is_empty() {
        println!("No delegated tasks.");
        return;
    }
    println!("{:<38} {:<12} {:<12} UPDATED", "TASK", "SUB-AGENT", "STATUS");
    for task in list {
        let status = serde_json::to_value(task.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        println!(
            "{:<38} {:<12} {:<12} {}",
            task.task_id,
            task.subagent,
            status,
            task.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

pub fn pending(list: &[InterruptRequest]) {
    if list.is_empty() {
        println!("No pending reviews.");
        return;
    }
    for request in list {
        println!("{}  {}  {}", request.id, request.tool_name, request.description);
    }
}

/// Single line, at most `max_chars` characters
pub fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_chars {
        s
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a\nb", 10), "a b");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }
}
