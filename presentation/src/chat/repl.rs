//! REPL (Read-Eval-Print Loop) for interactive chat

use super::sink::ConsoleReplySink;
use crate::ConsoleFormatter;
use colored::Colorize;
use parley_application::ChatSession;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;
use tracing::debug;

/// Slash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Quit,
    Help,
    History,
    Model,
    Unknown(String),
}

impl ChatCommand {
    /// Parse a line starting with `/`. Returns `None` for ordinary messages.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        let command = match line {
            "/quit" | "/exit" | "/q" => ChatCommand::Quit,
            "/help" | "/h" | "/?" => ChatCommand::Help,
            "/history" => ChatCommand::History,
            "/model" => ChatCommand::Model,
            other => ChatCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    session: ChatSession,
    show_progress: bool,
    history_location: Option<String>,
}

impl ChatRepl {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session,
            show_progress: true,
            history_location: None,
        }
    }

    /// Set whether to show the "Thinking..." spinner
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Where the conversation is stored, shown in the banner
    pub fn with_history_location(mut self, location: impl Into<String>) -> Self {
        self.history_location = Some(location.into());
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        // Typed-line recall, separate from the conversation log
        let input_history = input_history_path();
        if let Some(ref path) = input_history {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();
        self.print_history();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if let Some(command) = ChatCommand::parse(line) {
                        if self.handle_command(command) {
                            break;
                        }
                        continue;
                    }

                    self.process_message(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = input_history {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│                parley - chat                │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "{} {} ({})",
            "Model:".bold(),
            self.session.model(),
            self.session.provider_name()
        );
        match &self.history_location {
            Some(location) => println!("{} {}", "History:".bold(), location),
            None => println!("{} {}", "History:".bold(), "not saved".dimmed()),
        }
        println!();
        println!("Type a message and press Enter. Ctrl-C stops a reply, Ctrl-D exits.");
        println!("Type /help for commands.");
        println!();
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /help, /h, /?    - Show this help");
        println!("  /history         - Show the conversation so far");
        println!("  /model           - Show the current model");
        println!("  /quit, /exit, /q - Exit chat");
        println!();
    }

    fn print_history(&self) {
        let messages = self.session.messages();
        if messages.is_empty() {
            return;
        }
        println!("{}", "─".repeat(50).dimmed());
        for message in messages {
            println!("{}", ConsoleFormatter::format_message(message));
        }
        println!("{}", "─".repeat(50).dimmed());
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, command: ChatCommand) -> bool {
        match command {
            ChatCommand::Quit => {
                println!("Bye!");
                true
            }
            ChatCommand::Help => {
                Self::print_help();
                false
            }
            ChatCommand::History => {
                if self.session.messages().is_empty() {
                    println!("{}", "No messages yet.".dimmed());
                } else {
                    self.print_history();
                }
                false
            }
            ChatCommand::Model => {
                println!(
                    "{} {} ({})",
                    "Model:".bold(),
                    self.session.model(),
                    self.session.provider_name()
                );
                false
            }
            ChatCommand::Unknown(cmd) => {
                println!("Unknown command: {}", cmd);
                println!("Type /help for available commands");
                false
            }
        }
    }

    async fn process_message(&mut self, text: &str) {
        println!();
        println!("{}", ConsoleFormatter::label(parley_domain::Role::Assistant));

        let mut sink = ConsoleReplySink::new(std::io::stdout());
        if self.show_progress {
            sink = sink.with_spinner();
        }

        // Ctrl-C while streaming stops the reply instead of the process
        let signal = self.session.cancel_signal();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Ctrl-C during reply, cancelling");
                signal.request_cancel();
            }
        });

        let output = self.session.send_message(text, &mut sink).await;
        watcher.abort();
        sink.finish();

        if let Some(line) = ConsoleFormatter::format_turn_end(&output, sink.wrote_any()) {
            println!("{}", line);
        }
        println!();
    }
}

fn input_history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("parley").join("input_history.txt"))
}
