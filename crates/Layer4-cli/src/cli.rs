//! Prompt loop and reviewer prompt

use crate::app::App;
use crate::render;
use orca_agent::{Decision, InterruptError, ResumeError, TurnOutcome};
use serde_json::Value;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

fn stdin_lines() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

fn prompt(label: &str) {
    print!("{}", label);
    let _ = std::io::stdout().flush();
}

/// Run a single prompt; reviews are still read from stdin
pub async fn run_once(app: &mut App, message: &str) -> anyhow::Result<()> {
    let mut input = stdin_lines();
    run_turn(app, &mut input, message).await
}

pub async fn repl(app: &mut App) -> anyhow::Result<()> {
    let mut input = stdin_lines();
    println!("Orca - type a prompt, /help for commands");

    loop {
        prompt("> ");
        let Some(line) = input.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/help" => {
                println!("/ps       background processes");
                println!("/tasks    delegated tasks");
                println!("/pending  reviews waiting on a decision");
                println!("/quit     exit (kills background processes)");
            }
            "/ps" => render::processes(&app.processes.list().await),
            "/tasks" => render::tasks(&app.tasks.list().await),
            "/pending" => render::pending(&app.agent.pending()),
            command if command.starts_with('/') => {
                println!("Unknown command: {}", command);
            }
            message => {
                if let Err(e) = run_turn(app, &mut input, message).await {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }
    Ok(())
}

/// Run one turn, answering reviews until it stops suspending
async fn run_turn(app: &mut App, input: &mut Input, message: &str) -> anyhow::Result<()> {
    let mut outcome = app.send(message).await?;

    while let TurnOutcome::Suspended(request) = &outcome {
        let request = request.clone();
        render::review_request(&request);

        let answer = loop {
            prompt("review> ");
            let Some(line) = input.next_line().await? else {
                println!("\nReview left pending.");
                return Ok(());
            };
            match parse_decision(&line) {
                Ok(answer) => break answer,
                Err(hint) => println!("{}", hint),
            }
        };

        if let Some(expired) = app.sweep_expired().await? {
            println!("Review expired; the action was rejected.");
            outcome = expired;
            continue;
        }

        let resumed = match answer {
            Answer::Decide(decision) => app.resume(&request.id, decision).await,
            Answer::ApproveForSession => app.approve_for_session(&request.id).await,
        };
        match resumed {
            Ok(next) => outcome = next,
            Err(ResumeError::Interrupt(e @ InterruptError::DecisionNotAllowed { .. })) => {
                println!("{}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    render::outcome(&outcome);
    Ok(())
}

const EDIT_HINT: &str = r#"edit needs a JSON object, e.g. edit {"path": "a.txt"}"#;

/// What the reviewer typed
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Decide(Decision),
    /// Approve and stop asking about this exact action
    ApproveForSession,
}

/// `approve`, `always`, `reject <reason>` or `edit <json>`
pub fn parse_decision(line: &str) -> Result<Answer, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let decision = match word.to_ascii_lowercase().as_str() {
        "approve" | "a" | "y" | "yes" => Decision::Approve,
        "always" | "s" | "session" => return Ok(Answer::ApproveForSession),
        "reject" | "r" | "n" | "no" => {
            let reason = if rest.is_empty() {
                "no reason given"
            } else {
                rest
            };
            Decision::reject(reason)
        }
        "edit" | "e" => match serde_json::from_str::<Value>(rest) {
            Ok(arguments) if arguments.is_object() => Decision::Edit { arguments },
            Ok(_) => return Err(EDIT_HINT.to_string()),
            Err(e) => return Err(format!("Invalid JSON for edit: {}", e)),
        },
        _ => return Err("Answer with approve, always, reject <reason> or edit <json>".to_string()),
    };
    Ok(Answer::Decide(decision))
}
