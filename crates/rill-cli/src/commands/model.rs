//! /model command - list and switch models

use super::CommandResult;
use rill_ai::{ModelSelector, models};

pub struct ModelCommand;

impl ModelCommand {
    /// Opens the selector with no args, otherwise switches to the matching model
    pub fn execute(args: &str) -> CommandResult {
        if args.is_empty() {
            return CommandResult::OpenModelSelector;
        }

        match models::find_model(args) {
            Some(model) => CommandResult::ChangeModel(model.selector()),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /model to list available models",
                args
            )),
        }
    }

    /// List models as text (for CLI mode)
    pub fn list_models_text(current: ModelSelector) -> String {
        let mut output = String::from("Available models:\n");
        for model in models::get_all_models() {
            let marker = if model.id == current.id() { " *" } else { "" };
            output.push_str(&format!("  {}  {}{}\n", model.id, model.name, marker));
        }
        output.push_str("\nSwitch with: /model <name|id>");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_marks_current_model() {
        let text = ModelCommand::list_models_text(ModelSelector(2));
        assert!(text.contains("  1  Ollama\n"));
        assert!(text.contains("  2  Gemini *\n"));
    }

    #[test]
    fn test_switch_by_id_and_prefix() {
        assert_eq!(
            ModelCommand::execute("1"),
            CommandResult::ChangeModel(ModelSelector(1))
        );
        assert_eq!(
            ModelCommand::execute("gem"),
            CommandResult::ChangeModel(ModelSelector(2))
        );
    }

    #[test]
    fn test_unknown_model_is_a_message() {
        assert!(matches!(
            ModelCommand::execute("gpt"),
            CommandResult::Message(text) if text.contains("'gpt'")
        ));
    }
}
