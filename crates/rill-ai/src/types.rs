//! Core types for chat interactions

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::ModelSelector;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get a human-readable label for this role
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single message in the conversation.
///
/// Messages are values: the in-progress assistant reply is updated by
/// building a new `Message` and swapping it in, never by editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Name of the file sent along with a user message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachment_name: None,
        }
    }

    /// Create a user message that carried an attachment
    pub fn user_with_attachment(content: impl Into<String>, attachment_name: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachment_name: Some(attachment_name.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachment_name: None,
        }
    }

    /// Create the empty assistant message shown while a reply streams in
    pub fn assistant_placeholder() -> Self {
        Self::assistant(String::new())
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// A file sent along with a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name reported to the endpoint and shown in the conversation
    pub file_name: String,
    /// MIME type of the part
    pub mime_type: String,
    /// Raw file contents
    pub data: Vec<u8>,
}

impl Attachment {
    /// MIME type used when nothing more specific is known
    pub const DEFAULT_MIME_TYPE: &'static str = "application/octet-stream";

    /// Create an attachment from in-memory bytes
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: Self::DEFAULT_MIME_TYPE.to_string(),
            data: data.into(),
        }
    }

    /// Override the MIME type
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read an attachment from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidConfig(format!("not a file path: {}", path.display()))
            })?;
        let data = tokio::fs::read(path).await?;
        tracing::debug!("Loaded attachment {} ({} bytes)", file_name, data.len());
        Ok(Self::new(file_name, data))
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Everything one submit sends to the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    pub model: ModelSelector,
    pub attachment: Option<Attachment>,
}

impl ChatRequest {
    /// Create a text-only request
    pub fn new(prompt: impl Into<String>, model: ModelSelector) -> Self {
        Self {
            prompt: prompt.into(),
            model,
            attachment: None,
        }
    }

    /// Attach a file
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// True when there is nothing to send: a blank prompt and no attachment
    pub fn is_empty(&self) -> bool {
        self.prompt.trim().is_empty() && self.attachment.is_none()
    }

    /// Name of the attached file, if any
    pub fn attachment_name(&self) -> Option<&str> {
        self.attachment.as_ref().map(|a| a.file_name.as_str())
    }
}

/// Which request encoding the endpoint expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Multipart form with prompt, model id and optional file
    #[default]
    Chat,
    /// JSON body with model name and prompt
    Analyze,
}

impl EndpointKind {
    /// Parse from a config or command-line value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Some(EndpointKind::Chat),
            "analyze" | "analyse" => Some(EndpointKind::Analyze),
            _ => None,
        }
    }

    /// Path of the endpoint relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            EndpointKind::Chat => "/api/chats",
            EndpointKind::Analyze => "/api/chats/analyze",
        }
    }

    /// Whether requests of this kind can carry a file
    pub fn supports_attachments(&self) -> bool {
        matches!(self, EndpointKind::Chat)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EndpointKind::Chat => "chat",
            EndpointKind::Analyze => "analyze",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_prompt_without_attachment_is_empty() {
        assert!(ChatRequest::new("", ModelSelector::default()).is_empty());
        assert!(ChatRequest::new("  \n\t", ModelSelector::default()).is_empty());
        assert!(!ChatRequest::new("hi", ModelSelector::default()).is_empty());
    }

    #[test]
    fn test_attachment_alone_is_not_empty() {
        let req = ChatRequest::new("", ModelSelector::default())
            .with_attachment(Attachment::new("notes.txt", b"abc".to_vec()));
        assert!(!req.is_empty());
        assert_eq!(req.attachment_name(), Some("notes.txt"));
    }

    #[test]
    fn test_placeholder_is_empty_assistant() {
        let msg = Message::assistant_placeholder();
        assert!(msg.is_assistant());
        assert!(msg.content.is_empty());
        assert!(msg.attachment_name.is_none());
    }

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::user_with_attachment("hi", "a.csv")).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["attachment_name"], "a.csv");

        let json = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert!(json.get("attachment_name").is_none());
    }

    #[test]
    fn test_endpoint_kind_parse_and_paths() {
        assert_eq!(EndpointKind::parse("chat"), Some(EndpointKind::Chat));
        assert_eq!(EndpointKind::parse(" Analyze "), Some(EndpointKind::Analyze));
        assert_eq!(EndpointKind::parse("other"), None);
        assert_eq!(EndpointKind::Chat.path(), "/api/chats");
        assert_eq!(EndpointKind::Analyze.path(), "/api/chats/analyze");
        assert!(EndpointKind::Chat.supports_attachments());
        assert!(!EndpointKind::Analyze.supports_attachments());
    }

    #[tokio::test]
    async fn test_attachment_from_path_uses_file_name() {
        let dir = std::env::temp_dir().join(format!("rill-attach-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("report.txt");
        tokio::fs::write(&path, b"quarterly numbers").await.unwrap();

        let attachment = Attachment::from_path(&path).await.unwrap();
        assert_eq!(attachment.file_name, "report.txt");
        assert_eq!(attachment.mime_type, Attachment::DEFAULT_MIME_TYPE);
        assert_eq!(attachment.data, b"quarterly numbers");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_attachment_from_missing_path_is_io_error() {
        let err = Attachment::from_path("/definitely/not/here.bin").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {:?}", err);
    }
}
