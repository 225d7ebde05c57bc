//! UI-agnostic conversation types
//!
//! These are the wire shapes exchanged between the client components and the
//! server endpoints. They don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// A chat message in the AI conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Successful reply from `POST /api/chat`.
///
/// `edit`, when present, is a full-document markup replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<String>,
}

impl ChatResponse {
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            edit: None,
        }
    }
}

/// Body of `POST /api/agent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub result: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("Hi!")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Hi!"}"#);

        let msg: ChatMessage = serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert_eq!(msg.role, ChatRole::System);
    }

    #[test]
    fn test_chat_response_edit_is_optional() {
        let resp: ChatResponse = serde_json::from_str(r#"{"reply":"Y"}"#).unwrap();
        assert_eq!(resp, ChatResponse::reply("Y"));

        let json = serde_json::to_string(&ChatResponse::reply("Y")).unwrap();
        assert_eq!(json, r#"{"reply":"Y"}"#);
    }
}
