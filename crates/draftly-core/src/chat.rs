//! Chat side panel: an append-only conversation with the assistant.

use std::fmt::Display;

use tokio::sync::mpsc::UnboundedSender;

use crate::request::{RequestSequence, RequestToken};
use crate::shell::DocumentChange;
use crate::state::{ChatMessage, ChatResponse};

pub const GREETING: &str = "Hi! Ask me anything, or tell me to fix selected text.";
pub const FAILURE_MESSAGE: &str = "AI request failed. Check API key/server logs.";

/// Input prefix that routes the rest of the line to the search agent
pub const SEARCH_PREFIX: &str = "/search ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Full history for the chat endpoint
    Chat(Vec<ChatMessage>),
    /// Query for the agent endpoint
    Agent(String),
}

#[derive(Debug, Clone)]
pub struct PendingChat {
    pub token: RequestToken,
    pub outbound: Outbound,
}

fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct ChatPanel {
    messages: Vec<ChatMessage>,
    input: String,
    cursor: usize,
    requests: RequestSequence,
    updates: UnboundedSender<DocumentChange>,
}

impl ChatPanel {
    pub fn new(updates: UnboundedSender<DocumentChange>) -> Self {
        Self::with_history(vec![ChatMessage::assistant(GREETING)], updates)
    }

    pub fn with_history(messages: Vec<ChatMessage>, updates: UnboundedSender<DocumentChange>) -> Self {
        Self {
            messages,
            input: String::new(),
            cursor: 0,
            requests: RequestSequence::default(),
            updates,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in the input, in chars
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_loading(&self) -> bool {
        self.requests.is_pending()
    }

    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Appends the typed turn and returns the request to send. Blank input,
    /// or input while a reply is still pending, sends nothing.
    pub fn submit(&mut self) -> Option<PendingChat> {
        if self.input.trim().is_empty() || self.is_loading() {
            return None;
        }

        let content = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.messages.push(ChatMessage::user(content.clone()));

        let outbound = match content.strip_prefix(SEARCH_PREFIX) {
            Some(query) if !query.trim().is_empty() => Outbound::Agent(query.trim().to_string()),
            _ => Outbound::Chat(self.messages.clone()),
        };

        Some(PendingChat {
            token: self.requests.issue(),
            outbound,
        })
    }

    /// Appends the assistant's reply (or the failure message). An `edit`
    /// field replaces the whole document right away. Returns false for
    /// stale tokens.
    pub fn complete<E: Display>(&mut self, token: RequestToken, result: Result<ChatResponse, E>) -> bool {
        if !self.requests.settle(token) {
            return false;
        }

        match result {
            Ok(response) => {
                self.messages.push(ChatMessage::assistant(response.reply));
                if let Some(edit) = response.edit {
                    if self.updates.send(DocumentChange::Assistant(edit)).is_err() {
                        tracing::warn!("document update channel closed");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                self.messages.push(ChatMessage::assistant(FAILURE_MESSAGE));
            }
        }
        true
    }
}
