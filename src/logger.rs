use crate::utils::find_char_boundary;
use anyhow::Result;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Per-session log file under the configured log directory.
pub struct Logger {
    log_file: PathBuf,
}

/// Counters shown in the end-of-session summary.
#[derive(Debug)]
pub struct SessionMetrics {
    pub statements_sent: usize,
    pub rpc_errors: usize,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            statements_sent: 0,
            rpc_errors: 0,
        }
    }

    pub fn display(&self) {
        use colored::Colorize;
        println!("\n{}", "━━━━━━━━━ Session Statistics ━━━━━━━━━".bright_cyan().bold());
        println!("Statements sent: {}", self.statements_sent.to_string().green());
        println!("RPC errors: {}", self.rpc_errors.to_string().red());
        println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_cyan());
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new(log_dir: &str) -> Result<Self> {
        let dir = PathBuf::from(log_dir);
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = dir.join(format!("session_{}.log", timestamp));

        Ok(Self { log_file })
    }

    pub fn log(&self, message: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, message)?;
        Ok(())
    }

    pub fn log_exec(&self, code: &str) -> Result<()> {
        self.log(&format!("EXEC: {}", preview(code)))
    }

    pub fn log_output(&self, text: &str) -> Result<()> {
        self.log(&format!("OUTPUT: {}", preview(text)))
    }

    pub fn log_error(&self, error: &str) -> Result<()> {
        self.log(&format!("ERROR: {}", error))
    }
}

/// Truncate long payloads for the log, never splitting a char.
fn preview(text: &str) -> String {
    let text = text.trim_end_matches('\n');
    if text.len() > 200 {
        let end = find_char_boundary(text, 200);
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}
