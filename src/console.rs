use crate::config::AppConfig;
use crate::logger::{Logger, SessionMetrics};
use crate::rpc::RpcClient;
use crate::session::{ConsoleState, Submission, HISTORY_CAP};
use anyhow::{Context as _, Result};
use colored::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{
    CompletionType, Config, Context, Editor, ExternalPrinter, Helper, Highlighter, Validator,
};
use std::sync::Arc;

/// Console commands, recognized only while no statement is pending.
const COMMANDS: &[&str] = &["/help", "/quit", "/exit", "/clear", "/history"];

/// Rustyline helper providing command tab-completion and inline hints.
#[derive(Helper, Validator, Highlighter)]
struct CommandCompleter;

impl Hinter for CommandCompleter {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint when cursor is at end and line starts with '/'
        if pos != line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }

        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && **cmd != line)
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if !prefix.starts_with('/') || prefix.contains(' ') {
            return Ok((0, vec![]));
        }

        let matches: Vec<Pair> = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

pub fn print_banner() {
    println!("{}", "====================================".bright_cyan());
    println!("{}", "            PYCONSOLE               ".bright_cyan().bold());
    println!("{}", "====================================".bright_cyan());
    println!("{}", " Interactive console for a remote Python service".bright_white());
    println!("{}\n", " Type /help for commands or /quit to exit".dimmed());
}

fn print_help() {
    println!("\n{}", "Available Commands:".bright_cyan().bold());
    println!("  {}  - Exit the console", "/quit, /exit".green());
    println!("  {}         - Show this help", "/help".green());
    println!("  {}        - Discard the pending multi-line input", "/clear".green());
    println!("  {}      - Show input history (newest first)", "/history".green());
    println!();
    println!("{}", " Anything else is sent to the remote interpreter.".dimmed());
    println!("{}", " Statements ending in ':' or '\\' continue on the next".dimmed());
    println!("{}", " line; a blank line closes an open block.".dimmed());
    println!();
}

/// Interactive console entry point. Connects, spawns the output poll
/// loop, then reads and submits lines until EOF or /quit.
pub async fn start(config: &AppConfig) -> Result<()> {
    print_banner();

    let client = RpcClient::new(config);
    let logger =
        Arc::new(Logger::new(&config.log_dir).context("Failed to create session log")?);

    // One blocking call at startup; the console is unusable without a
    // session, so a failure here is fatal.
    let session_id = client
        .start_session()
        .await
        .with_context(|| format!("Could not start a session at {}", client.url()))?;
    println!(
        "{} {} → {}",
        "✓ Session:".green(),
        session_id.bright_white(),
        client.url().dimmed()
    );
    let _ = logger.log(&format!("session {} started at {}", session_id, client.url()));

    // Line editor: Enter submits, Up/Down recall history. Mirror the
    // session model's history semantics: capped, duplicates kept.
    let rl_config = Config::builder()
        .max_history_size(HISTORY_CAP)?
        .history_ignore_dups(false)?
        .history_ignore_space(false)
        .auto_add_history(false)
        .completion_type(CompletionType::List)
        .build();
    let mut rl = Editor::with_config(rl_config).context("Failed to create line editor")?;
    rl.set_helper(Some(CommandCompleter));

    let printer = rl
        .create_external_printer()
        .context("Failed to create output printer")?;
    tokio::spawn(poll_output(
        client.clone(),
        session_id.clone(),
        printer,
        logger.clone(),
    ));

    let mut state = ConsoleState::new();
    let mut metrics = SessionMetrics::new();

    loop {
        let prompt = if state.pending() {
            state.prompt().dimmed().to_string()
        } else {
            state.prompt().yellow().bold().to_string()
        };

        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                println!("{} {}", "✗ Input error:".red(), e);
                continue;
            }
        };

        // Commands only apply at the top level; inside a block a line
        // starting with '/' is code.
        if !state.pending() && line.starts_with('/') {
            let cmd = line.trim();
            if cmd == "/quit" || cmd == "/exit" {
                println!("Goodbye!");
                break;
            }
            if cmd == "/help" {
                print_help();
                continue;
            }
            if cmd == "/clear" {
                state.reset();
                println!("{}", "✓ Pending input discarded.".green());
                continue;
            }
            if cmd == "/history" {
                if state.history().is_empty() {
                    println!("{}", "No input history yet.".yellow());
                } else {
                    println!("\n{}", "Input History (newest first):".bright_cyan().bold());
                    for (i, entry) in state.history().iter().enumerate() {
                        println!("  {}. {}", i + 1, entry.bright_white());
                    }
                    println!();
                }
                continue;
            }
            // Unknown '/' input falls through to the interpreter.
        }

        let _ = rl.add_history_entry(&line);

        match state.submit_line(&line) {
            Submission::Exec(code) => {
                metrics.statements_sent += 1;
                let _ = logger.log_exec(&code);
                // Fire-and-forget: the response carries no output, only
                // transport failures are worth reporting.
                if let Err(e) = client.exec(&session_id, &code).await {
                    metrics.rpc_errors += 1;
                    let _ = logger.log_error(&format!("exec failed: {e:#}"));
                    println!("{} {e:#}", "✗ Exec error:".red());
                }
            }
            Submission::Pending | Submission::Empty => {}
        }
    }

    println!("\n{}", "Session ended.".bright_cyan());
    metrics.display();
    Ok(())
}

/// Continuous output pull loop: each poll is issued immediately after
/// the previous one resolves, so displayed lines follow arrival order.
/// Transient failures are retried inside the RPC client; once retries
/// are exhausted, polling stops with a visible message.
async fn poll_output<P>(client: RpcClient, session_id: String, mut printer: P, logger: Arc<Logger>)
where
    P: ExternalPrinter + Send + 'static,
{
    loop {
        match client.output(&session_id).await {
            Ok(batch) => {
                if batch.result.is_empty() {
                    continue;
                }
                let _ = logger.log_output(&batch.result);
                for line in batch.result.split('\n') {
                    if line.is_empty() {
                        continue;
                    }
                    let rendered = if batch.error {
                        line.red().italic().to_string()
                    } else {
                        line.blue().to_string()
                    };
                    if printer.print(rendered).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                let _ = logger.log_error(&format!("output polling stopped: {e:#}"));
                let _ = printer.print(format!("{} {e:#}", "✗ Output polling stopped:".red()));
                return;
            }
        }
    }
}
