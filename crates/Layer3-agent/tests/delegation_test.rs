//! Delegation to sub-agents through `ask_subagents`

use chrono::Utc;
use orca_agent::{
    Agent, AgentContext, AskSubagentsTool, DelegationRequest, Delegator, Session, TurnOutcome,
};
use async_trait::async_trait;
use orca_core::ToolRegistry;
use orca_foundation::{Error, PermissionService};
use orca_provider::{
    Message, Provider, ProviderError, ProviderResponse, ScriptedProvider, ScriptedTurn, ToolCall,
    ToolDef,
};
use orca_task::{DelegationStatus, ProcessManager, TaskRecord, TaskStatus, TaskStore};
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Notify;

fn base_tools() -> ToolRegistry {
    ToolRegistry::with_builtins(Arc::new(ProcessManager::default()))
}

fn delegator(dir: &Path, provider: Arc<ScriptedProvider>) -> Arc<Delegator> {
    Arc::new(Delegator::new(
        provider,
        base_tools(),
        Arc::new(PermissionService::new()),
        Arc::new(TaskStore::new()),
        dir,
    ))
}

fn finish_call(result: &str, summary: &str) -> ProviderResponse {
    ProviderResponse::tool_calls(
        "",
        vec![ToolCall::new(
            "f1",
            "finish",
            json!({ "result": result, "summary": summary }),
        )],
    )
}

#[tokio::test]
async fn test_plain_reply_is_reported_incomplete() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![
        // parent
        ProviderResponse::tool_calls(
            "",
            vec![ToolCall::new(
                "call_1",
                "ask_subagents",
                json!({
                    "subagent_id": "general",
                    "task_name": "find TODOs",
                    "task_description": "Find TODO comments in src/"
                }),
            )],
        ),
        // child
        ProviderResponse::text("I found two TODOs in main.rs"),
        // parent again
        ProviderResponse::text("The sub-agent found two TODOs."),
    ]));
    let delegator = delegator(temp.path(), provider.clone());

    let mut tools = base_tools();
    tools.register(Arc::new(AskSubagentsTool::new(delegator.clone())));
    let agent = Agent::new(AgentContext::new(
        provider.clone(),
        tools,
        Arc::new(PermissionService::new()),
        temp.path(),
    ));
    let mut session = Session::new();

    let outcome = agent.run(&mut session, "look for TODOs").await.unwrap();
    assert_eq!(
        outcome,
        TurnOutcome::Completed {
            response: "The sub-agent found two TODOs.".to_string()
        }
    );

    let report = session.history.messages()[2].tool_result.clone().unwrap();
    assert!(!report.is_error);
    assert!(report.content.starts_with("## ⚠️ Task not properly completed"));
    assert!(report.content.contains("I found two TODOs in main.rs"));
    assert!(report.content.contains("task_id: call_1"));

    let record = delegator.store().get("call_1").await.unwrap();
    assert_eq!(record.status, TaskStatus::Incomplete);
    assert_eq!(record.subagent, "general");
    assert!(record.has_snapshot());

    // the child saw neither ask_subagents nor the parent's history
    let requests = provider.requests();
    let child = &requests[1];
    assert!(!child.tool_names.iter().any(|n| n == "ask_subagents"));
    assert!(child.tool_names.iter().any(|n| n == "finish"));
    assert_eq!(child.messages.len(), 1);
    assert!(child.messages[0].content.starts_with("# Task: find TODOs"));
}

#[tokio::test]
async fn test_resume_continues_from_snapshot() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![
        ProviderResponse::text("found 2 in src/"),
        finish_call("3 TODOs total", "searched src and tests"),
    ]));
    let delegator = delegator(temp.path(), provider.clone());

    let first = delegator
        .delegate(
            DelegationRequest::new("general", "Find TODOs in src/"),
            Some("call_1"),
        )
        .await
        .unwrap();
    assert_eq!(first.status, DelegationStatus::Incomplete);
    assert_eq!(first.task_id, "call_1");

    let second = delegator
        .delegate(
            DelegationRequest::new("general", "Also check tests/").with_task_id("call_1"),
            Some("call_2"),
        )
        .await
        .unwrap();
    assert_eq!(second.status, DelegationStatus::Completed);
    assert_eq!(second.task_id, "call_1");
    assert_eq!(second.result, "3 TODOs total");
    assert_eq!(second.summary.as_deref(), Some("searched src and tests"));

    let requests = provider.requests();
    let resumed = &requests[1].messages;
    assert!(resumed.iter().any(|m| m.content == "found 2 in src/"));
    assert!(resumed
        .last()
        .unwrap()
        .content
        .starts_with("# Follow-up: Also check tests/"));

    let record = delegator.store().get("call_1").await.unwrap();
    assert_eq!(record.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_taken_id_gets_a_fresh_one() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![
        ProviderResponse::text("one"),
        ProviderResponse::text("two"),
    ]));
    let delegator = delegator(temp.path(), provider);

    let first = delegator
        .delegate(DelegationRequest::new("general", "first"), Some("call_9"))
        .await
        .unwrap();
    let second = delegator
        .delegate(DelegationRequest::new("general", "second"), Some("call_9"))
        .await
        .unwrap();

    assert_eq!(first.task_id, "call_9");
    assert_ne!(second.task_id, "call_9");
    assert_eq!(delegator.store().len().await, 2);
}

#[tokio::test]
async fn test_child_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::new(vec![ScriptedTurn::Fail {
        error: "model unavailable".to_string(),
    }]));
    let delegator = delegator(temp.path(), provider);

    let report = delegator
        .delegate(DelegationRequest::new("general", "anything"), Some("call_1"))
        .await
        .unwrap();

    assert_eq!(report.status, DelegationStatus::Failed);
    assert!(report.result.contains("model unavailable"));
    assert!(report.to_string().starts_with("## ❌ Task failed"));

    let record = delegator.store().get("call_1").await.unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_malformed_snapshot_is_a_failure() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![]));
    let delegator = delegator(temp.path(), provider.clone());
    delegator
        .store()
        .write(TaskRecord {
            task_id: "t1".to_string(),
            subagent: "general".to_string(),
            status: TaskStatus::Incomplete,
            snapshot: json!("garbage"),
            updated_at: Utc::now(),
        })
        .await
        .unwrap();

    let report = delegator
        .delegate(
            DelegationRequest::new("general", "continue").with_task_id("t1"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(report.status, DelegationStatus::Failed);
    assert!(report.result.contains("Cannot resume task t1"));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_unknown_subagent_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![]));
    let delegator = delegator(temp.path(), provider);

    let err = delegator
        .delegate(DelegationRequest::new("wizard", "anything"), None)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Unknown sub-agent 'wizard'"));
    assert!(message.contains("explore"));
    assert!(delegator.store().is_empty().await);
}

#[tokio::test]
async fn test_child_gated_action_is_rejected_without_reviewer() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![
        ProviderResponse::tool_calls(
            "",
            vec![ToolCall::new(
                "w1",
                "write_file",
                json!({ "path": "notes.txt", "content": "x" }),
            )],
        ),
        ProviderResponse::text("could not write the file"),
    ]));
    let delegator = delegator(temp.path(), provider.clone());

    let report = delegator
        .delegate(DelegationRequest::new("general", "write notes"), None)
        .await
        .unwrap();

    assert_eq!(report.status, DelegationStatus::Incomplete);
    assert!(!temp.path().join("notes.txt").exists());

    let requests = provider.requests();
    let rejection = requests[1]
        .messages
        .iter()
        .filter_map(|m| m.tool_result.as_ref())
        .next()
        .unwrap();
    assert!(rejection.is_error);
    assert!(rejection.content.contains("needs review"));
}

#[tokio::test]
async fn test_explore_only_gets_its_tools() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::from_responses(vec![finish_call(
        "nothing found",
        "scanned",
    )]));
    let delegator = delegator(temp.path(), provider.clone());

    let report = delegator
        .delegate(DelegationRequest::new("explore", "scan"), None)
        .await
        .unwrap();

    assert_eq!(report.status, DelegationStatus::Completed);
    assert_eq!(
        provider.requests()[0].tool_names,
        vec!["finish".to_string(), "read_file".to_string()]
    );
}

/// Finishes every task, but holds the first call until released
#[derive(Default)]
struct HeldProvider {
    calls: AtomicUsize,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl Provider for HeldProvider {
    fn name(&self) -> &str {
        "held"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolDef],
        _system_prompt: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok(finish_call("done", "held"))
    }
}

#[tokio::test]
async fn test_running_task_id_cannot_be_delegated_twice() {
    let temp = TempDir::new().unwrap();
    let provider = Arc::new(HeldProvider::default());
    let delegator = Arc::new(Delegator::new(
        provider.clone(),
        base_tools(),
        Arc::new(PermissionService::new()),
        Arc::new(TaskStore::new()),
        temp.path(),
    ));

    let first = tokio::spawn({
        let delegator = delegator.clone();
        async move {
            delegator
                .delegate(
                    DelegationRequest::new("general", "long job").with_task_id("job"),
                    None,
                )
                .await
        }
    });
    provider.started.notified().await;

    let err = delegator
        .delegate(
            DelegationRequest::new("general", "same job again").with_task_id("job"),
            None,
        )
        .await
        .unwrap_err();
    match err {
        Error::InvalidInput(message) => assert!(message.contains("already running")),
        other => panic!("expected a usage error, got {:?}", other),
    }
    // the refused call never reached the model
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    provider.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.status, DelegationStatus::Completed);

    // released once the first run ended
    let again = delegator
        .delegate(
            DelegationRequest::new("general", "follow up").with_task_id("job"),
            None,
        )
        .await
        .unwrap();
    assert_eq!(again.status, DelegationStatus::Completed);
    assert_eq!(again.task_id, "job");
}
