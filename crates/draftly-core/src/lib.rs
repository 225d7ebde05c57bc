pub mod ai;
pub mod chat;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod markup;
pub mod prompts;
pub mod provider;
pub mod request;
pub mod shell;
pub mod state;
pub mod toolbar;

// Re-export main types for convenience
pub use ai::{GeminiClient, TavilyClient};
pub use chat::{ChatPanel, Outbound, PendingChat};
pub use client::ApiClient;
pub use config::Config;
pub use editor::{DocumentEditor, Motion, RichTextEngine, Selection};
pub use error::ProviderError;
pub use markup::MarkupEngine;
pub use prompts::EditAction;
pub use provider::Provider;
pub use request::RequestToken;
pub use shell::{DocumentChange, PageShell};
pub use state::{AgentRequest, AgentResponse, ChatMessage, ChatRequest, ChatResponse, ChatRole};
pub use toolbar::{FloatingToolbar, ScreenPosition, SelectionContext, ToolbarState};
