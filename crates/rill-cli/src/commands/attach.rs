//! /attach command - pick a file for the next prompt

use super::CommandResult;
use std::path::PathBuf;

pub struct AttachCommand;

impl AttachCommand {
    pub fn execute(args: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message("Usage: /attach <path>".to_string());
        }

        // strip the quotes terminals add when a file is dropped in
        let path = args
            .strip_prefix(['"', '\''])
            .and_then(|p| p.strip_suffix(['"', '\'']))
            .unwrap_or(args);
        CommandResult::Attach(PathBuf::from(path))
    }
}
