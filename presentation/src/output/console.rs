//! Console formatting for chat messages and turn endings

use colored::Colorize;
use parley_application::{TurnOutcome, TurnOutput, WARNING_MARKER};
use parley_domain::{Message, Role};

/// Shown when a turn completed without any text.
pub const NO_RESPONSE_NOTICE: &str = "⚠️ No response received";

/// Formats chat output for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Speaker label printed before a message.
    pub fn label(role: Role) -> String {
        match role {
            Role::User => "You:".green().bold().to_string(),
            Role::Assistant => "Assistant:".cyan().bold().to_string(),
        }
    }

    /// One replayed history message.
    pub fn format_message(message: &Message) -> String {
        let body = Self::colorize_reply(message.content());
        format!("{} {}", Self::label(message.role()), body)
    }

    /// Everything to print after a turn returns.
    ///
    /// `streamed` is true when the sink already printed the reply text.
    /// Returns `None` when nothing is left to print.
    pub fn format_turn_end(output: &TurnOutput, streamed: bool) -> Option<String> {
        match output.outcome {
            TurnOutcome::Skipped => None,
            TurnOutcome::Cancelled => Some("[stopped]".dimmed().to_string()),
            TurnOutcome::Failed(_) => Some(output.reply.red().to_string()),
            TurnOutcome::Completed if output.reply.is_empty() => {
                Some(NO_RESPONSE_NOTICE.red().to_string())
            }
            TurnOutcome::Completed if streamed => None,
            TurnOutcome::Completed => Some(Self::colorize_reply(&output.reply)),
        }
    }

    /// Warning replies are red; everything else is printed as-is.
    pub fn colorize_reply(text: &str) -> String {
        if text.starts_with(WARNING_MARKER) {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
