//! Model registry: the small-integer selectors the endpoint understands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Model selector sent to the endpoint as a decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelSelector(pub u32);

impl ModelSelector {
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Registry entry for this selector, if known
    pub fn info(&self) -> Option<&'static ModelInfo> {
        get_model_by_id(self.0)
    }

    /// Display name, falling back to the raw id
    pub fn display_name(&self) -> String {
        self.info()
            .map(|m| m.name.to_string())
            .unwrap_or_else(|| format!("model {}", self.0))
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        ModelSelector(MODELS[0].id)
    }
}

impl fmt::Display for ModelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: u32,
    pub name: &'static str,
}

impl ModelInfo {
    pub fn selector(&self) -> ModelSelector {
        ModelSelector(self.id)
    }
}

static MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: 1,
        name: "Ollama",
    },
    ModelInfo {
        id: 2,
        name: "Gemini",
    },
];

/// Look up a model by selector id.
pub fn get_model_by_id(id: u32) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

/// Get all registered models.
pub fn get_all_models() -> &'static [ModelInfo] {
    MODELS
}

/// Resolve user input to a model: numeric id, exact name, then name prefix.
pub fn find_model(query: &str) -> Option<&'static ModelInfo> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    if let Ok(id) = query.parse::<u32>() {
        return get_model_by_id(id);
    }

    let query_lower = query.to_lowercase();
    if let Some(model) = MODELS.iter().find(|m| m.name.to_lowercase() == query_lower) {
        return Some(model);
    }

    MODELS
        .iter()
        .find(|m| m.name.to_lowercase().starts_with(&query_lower))
}
