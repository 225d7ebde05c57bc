use draftly_core::{Config, GeminiClient, TavilyClient};

/// Provider clients shared by all requests. A missing client means its
/// credential is not configured.
#[derive(Clone, Default)]
pub struct AppState {
    pub gemini: Option<GeminiClient>,
    pub tavily: Option<TavilyClient>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gemini: config.gemini_client(),
            tavily: config.tavily_client(),
        }
    }
}
