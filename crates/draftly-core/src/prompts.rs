//! Prompt templates for the selection toolbar and the search agent.

use crate::ai::SearchResult;
use crate::state::ChatMessage;

pub const WRITING_ASSISTANT_PERSONA: &str = "You are a helpful writing assistant.";

/// Rewrite actions offered by the floating toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Improve,
    Shorten,
    Lengthen,
    Table,
}

impl EditAction {
    pub fn all() -> [EditAction; 4] {
        [
            EditAction::Improve,
            EditAction::Shorten,
            EditAction::Lengthen,
            EditAction::Table,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditAction::Improve => "Edit with AI",
            EditAction::Shorten => "Shorten",
            EditAction::Lengthen => "Lengthen",
            EditAction::Table => "Convert to Table",
        }
    }

    pub fn prompt(&self, selected_text: &str) -> String {
        let instruction = match self {
            EditAction::Improve => "Improve the writing, fix grammar, keep meaning same:",
            EditAction::Shorten => "Shorten this text while keeping key meaning:",
            EditAction::Lengthen => "Expand this text with 1-2 more sentences, same tone:",
            EditAction::Table => {
                "Convert this list-like text into a simple markdown table if possible. If not a list, just improve clarity:"
            }
        };
        format!("{instruction}\n\n\"{selected_text}\"")
    }

    /// The two-turn conversation sent to the chat endpoint for this action
    pub fn conversation(&self, selected_text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(WRITING_ASSISTANT_PERSONA),
            ChatMessage::user(self.prompt(selected_text)),
        ]
    }
}

/// Raw search output used when no summarizer is configured.
pub fn compose_search_results(answer: &str, results: &[SearchResult]) -> String {
    let links = results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} - {}", i + 1, r.title, r.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Search results (no Gemini summary):\n\n{answer}\n\nTop links:\n{links}")
}

/// Summarization prompt embedding every result and the original query.
pub fn summarize_search_prompt(query: &str, results: &[SearchResult]) -> String {
    let context = results
        .iter()
        .map(|r| format!("Title: {}\nSnippet: {}\nURL: {}", r.title, r.snippet, r.url))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Query: {query}\n\nSummarize the following search results in 4-6 bullet points and a short paragraph:\n\n{context}"
    )
}
