//! Wiring: config, policy, processes, task store, tools and the agent

use crate::render;
use anyhow::{bail, Context};
use orca_agent::{
    Agent, AgentContext, AgentEvent, AskSubagentsTool, Decision, Delegator, ResumeError, Session,
    TurnOutcome,
};
use orca_core::ToolRegistry;
use orca_foundation::{JsonStore, OrcaConfig, PermissionService, PROJECT_DIR};
use orca_provider::{Provider, ScriptedProvider};
use orca_task::{ProcessManager, SubAgentRegistry, TaskStore};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Script picked up from the project when `--script` is not given
const DEFAULT_SCRIPT: &str = "script.json";

pub struct App {
    pub agent: Agent,
    pub processes: Arc<ProcessManager>,
    pub tasks: Arc<TaskStore>,
    session: Session,
    events: mpsc::Receiver<AgentEvent>,
}

impl App {
    pub fn build(working_dir: PathBuf, script: Option<&Path>) -> anyhow::Result<Self> {
        let config = OrcaConfig::load(&working_dir).context("Failed to load config")?;
        let permissions = Arc::new(
            PermissionService::load(&working_dir).context("Failed to load permissions")?,
        );
        let provider = load_provider(&working_dir, script)?;

        let processes = Arc::new(
            ProcessManager::new(config.shell.clone(), config.process.clone())
                .with_working_dir(&working_dir),
        );

        let tasks = Arc::new(if config.task_store.persist {
            TaskStore::persistent(JsonStore::project(&working_dir))
                .context("Failed to open task store")?
        } else {
            TaskStore::new()
        });

        let base_tools = ToolRegistry::with_builtins(Arc::clone(&processes));
        let delegator = Delegator::new(
            Arc::clone(&provider),
            base_tools.clone(),
            Arc::clone(&permissions),
            Arc::clone(&tasks),
            &working_dir,
        )
        .with_subagents(SubAgentRegistry::from_config(&config.delegation.subagents))
        .with_max_turns(config.delegation.max_turns);

        let mut tools = base_tools;
        tools.register(Arc::new(AskSubagentsTool::new(Arc::new(delegator))));
        debug!("Tools: {}", tools.names().join(", "));

        let ctx = AgentContext::new(provider, tools, permissions, &working_dir)
            .with_max_iterations(config.agent.max_iterations)
            .with_review_expiry(config.review.expire_after());

        let (tx, events) = mpsc::channel(256);
        let agent = Agent::new(ctx).with_events(tx);

        info!("Orca ready in {}", working_dir.display());
        Ok(Self {
            agent,
            processes,
            tasks,
            session: Session::new(),
            events,
        })
    }

    pub async fn send(&mut self, message: &str) -> anyhow::Result<TurnOutcome> {
        let Self {
            agent,
            session,
            events,
            ..
        } = self;
        Ok(with_events(agent.run(session, message), events).await?)
    }

    pub async fn resume(
        &mut self,
        interrupt_id: &str,
        decision: Decision,
    ) -> Result<TurnOutcome, ResumeError> {
        let Self {
            agent,
            session,
            events,
            ..
        } = self;
        with_events(agent.resume(session, interrupt_id, decision), events).await
    }

    pub async fn approve_for_session(
        &mut self,
        interrupt_id: &str,
    ) -> Result<TurnOutcome, ResumeError> {
        let Self {
            agent,
            session,
            events,
            ..
        } = self;
        with_events(agent.approve_for_session(session, interrupt_id), events).await
    }

    /// Auto-reject the pending review if it has expired
    pub async fn sweep_expired(&mut self) -> Result<Option<TurnOutcome>, ResumeError> {
        let Self {
            agent,
            session,
            events,
            ..
        } = self;
        with_events(agent.sweep_expired(session, chrono::Utc::now()), events).await
    }

    pub async fn shutdown(&self) {
        self.processes.kill_all().await;
    }
}

fn load_provider(working_dir: &Path, script: Option<&Path>) -> anyhow::Result<Arc<dyn Provider>> {
    let path = match script {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = working_dir.join(PROJECT_DIR).join(DEFAULT_SCRIPT);
            if !fallback.exists() {
                bail!(
                    "No model script: pass --script FILE or create {}",
                    fallback.display()
                );
            }
            fallback
        }
    };

    let provider = ScriptedProvider::from_file(&path)
        .with_context(|| format!("Failed to load script {}", path.display()))?;
    info!("Loaded {} scripted turns from {}", provider.remaining(), path.display());
    Ok(Arc::new(provider))
}

/// Drive `turn` while printing agent events as they arrive
async fn with_events<T>(
    turn: impl Future<Output = T>,
    events: &mut mpsc::Receiver<AgentEvent>,
) -> T {
    tokio::pin!(turn);
    let output = loop {
        tokio::select! {
            output = &mut turn => break output,
            Some(event) = events.recv() => render::event(&event),
        }
    };
    while let Ok(event) = events.try_recv() {
        render::event(&event);
    }
    output
}
