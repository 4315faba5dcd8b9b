//! Slash commands shared by the REPL and the TUI

mod attach;
mod model;

pub use attach::AttachCommand;
pub use model::ModelCommand;

use rill_ai::ModelSelector;
use std::path::PathBuf;

/// Result of executing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Clear the conversation
    Clear,
    /// Change the model used for the next submit
    ChangeModel(ModelSelector),
    /// Load a file to send with the next prompt
    Attach(PathBuf),
    /// Drop the pending attachment
    Detach,
    /// Show a message to the user (not sent to the endpoint)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
    /// Open model selector (TUI only)
    OpenModelSelector,
}

/// Parse and execute a slash command
pub fn execute_command(input: &str) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "clear" | "c" => CommandResult::Clear,

        "quit" | "exit" | "q" => CommandResult::Exit,

        "model" | "m" => ModelCommand::execute(args),

        "attach" | "a" => AttachCommand::execute(args),

        "detach" | "d" => CommandResult::Detach,

        _ => CommandResult::Unknown(command),
    })
}

pub fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /model, /m [name]    List models or switch to a model (by name or id)
  /attach, /a <path>   Send a file with the next prompt
  /detach, /d          Drop the pending attachment
  /clear, /c           Clear the conversation
  /quit, /q            Exit"#
        .to_string()
}
