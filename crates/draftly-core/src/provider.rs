/// Third-party services the server proxies to. Each one is enabled by its own
/// credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Tavily,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Tavily => "tavily",
        }
    }

    pub fn all() -> Vec<Provider> {
        vec![Provider::Gemini, Provider::Tavily]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini (Google)",
            Provider::Tavily => "Tavily Search",
        }
    }

    /// Environment variable holding the provider's API key
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Tavily => "TAVILY_API_KEY",
        }
    }

    /// Fail-soft text returned by an endpoint when this provider's key is absent
    pub fn missing_key_warning(&self) -> &'static str {
        match self {
            Provider::Gemini => "⚠️ Missing GEMINI_API_KEY. Add it in .env.local and restart.",
            Provider::Tavily => "⚠️ Missing TAVILY_API_KEY. Add it in .env.local.",
        }
    }
}
