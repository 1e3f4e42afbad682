//! Command-line REPL
//!
//! rustyline blocks, so the prompt lives on its own thread and forwards
//! parsed [`HostCommand`]s to the host loop. Rendering helpers for the
//! binding table and status lines are here too.

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::mapping::RuleSet;
use crate::poller::EngineStatus;

/// One REPL request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    List,
    /// Learn the entry given by row number or name
    Learn(String),
    Cancel,
    Clear(String),
    Status,
    Save,
    Remote(bool),
    Help,
    Quit,
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<HostCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let entry_arg = |verb: &str| {
        if rest.is_empty() {
            Err(format!("usage: {} <row|name>", verb))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "list" | "ls" => HostCommand::List,
        "learn" => HostCommand::Learn(entry_arg("learn")?),
        "cancel" => HostCommand::Cancel,
        "clear" => HostCommand::Clear(entry_arg("clear")?),
        "status" => HostCommand::Status,
        "save" => HostCommand::Save,
        "remote" => match rest.to_ascii_lowercase().as_str() {
            "on" => HostCommand::Remote(true),
            "off" => HostCommand::Remote(false),
            _ => return Err("usage: remote on|off".to_string()),
        },
        "help" | "?" => HostCommand::Help,
        "quit" | "exit" => HostCommand::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

/// Start the prompt thread
///
/// End of input and Ctrl+C both request a quit.
pub fn spawn_repl(tx: mpsc::UnboundedSender<HostCommand>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("repl".to_string())
        .spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    warn!("REPL unavailable: {}", e);
                    return;
                },
            };

            loop {
                match rl.readline("pad> ") {
                    Ok(line) => {
                        let _ = rl.add_history_entry(line.as_str());
                        match parse_command(&line) {
                            Ok(Some(command)) => {
                                let quit = command == HostCommand::Quit;
                                if tx.send(command).is_err() || quit {
                                    break;
                                }
                            },
                            Ok(None) => {},
                            Err(msg) => println!("{}", msg.red()),
                        }
                    },
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        let _ = tx.send(HostCommand::Quit);
                        break;
                    },
                    Err(e) => {
                        warn!("REPL error: {}", e);
                        let _ = tx.send(HostCommand::Quit);
                        break;
                    },
                }
            }
            debug!("REPL stopped");
        })
}

/// Binding table, one row per entry, numbered from 1
pub fn format_bindings(rules: &RuleSet, learning: Option<&str>) -> String {
    let mut out = String::new();
    for (row, entry) in rules.entries().iter().enumerate() {
        let label = entry.binding_label();
        let binding = if learning == Some(entry.name.as_str()) {
            "(learning...)".yellow().to_string()
        } else if entry.rule.is_bound() {
            label.green().to_string()
        } else {
            label.dimmed().to_string()
        };
        out.push_str(&format!(
            "  {:>2}  {:<22} {:<16} {}\n",
            row + 1,
            entry.name,
            entry.action.name(),
            binding
        ));
    }
    out
}

pub fn print_bindings(status: &EngineStatus) {
    println!("\n{}", "Bindings:".bold());
    print!("{}", format_bindings(&status.rules, status.learning.as_deref()));
}

pub fn print_status(status: &EngineStatus, remote_line: &str) {
    let device = match &status.device {
        Some(name) => name.green().to_string(),
        None => "none".red().to_string(),
    };
    println!("\n{}", "Status:".bold());
    println!("  Controller: {}", device);
    if let Some(entry) = &status.learning {
        println!("  Learning:   {}", entry.yellow());
    }
    if let Some((entry, at)) = &status.last_action {
        println!("  Last action: {} at {}", entry.cyan(), at.format("%H:%M:%S"));
    }
    println!("  {}", remote_line);
    println!("  {}", status.message);
}

pub fn print_help() {
    println!("\n{}", "Commands:".bold());
    for (cmd, help) in [
        ("list", "show bindings"),
        ("learn <row|name>", "bind the next gesture to an entry"),
        ("cancel", "stop learning"),
        ("clear <row|name>", "unbind an entry"),
        ("status", "controller, remote and last action"),
        ("save", "write bindings to the config file"),
        ("remote on|off", "start or stop the remote listener"),
        ("quit", "exit"),
    ] {
        println!("  {:<18} {}", cmd.cyan(), help);
    }
}
