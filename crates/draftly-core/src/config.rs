use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::ai::{GeminiClient, TavilyClient};
use crate::provider::Provider;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub tavily_base_url: Option<String>,
    pub listen_addr: Option<String>,
    pub server_url: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the config file (if any) and applies environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Ok(Self::load_from(&config_path)?.with_env())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn with_env(self) -> Self {
        self.apply_env(|name| std::env::var(name).ok())
    }

    /// Environment variables win over values from the file. Blank values are ignored.
    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(Provider::Gemini.key_env_var()) {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = var(Provider::Tavily.key_env_var()) {
            self.tavily_api_key = Some(key);
        }
        if let Some(model) = var("GEMINI_MODEL") {
            self.gemini_model = Some(model);
        }
        if let Some(addr) = var("DRAFTLY_LISTEN") {
            self.listen_addr = Some(addr);
        }
        if let Some(url) = var("DRAFTLY_SERVER_URL") {
            self.server_url = Some(url);
        }
        self
    }

    /// The provider's key, unless absent or blank
    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Tavily => self.tavily_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn gemini_client(&self) -> Option<GeminiClient> {
        let mut client = GeminiClient::new(self.api_key(Provider::Gemini)?);
        if let Some(model) = self.gemini_model.as_deref() {
            client = client.with_model(model);
        }
        if let Some(url) = self.gemini_base_url.as_deref() {
            client = client.with_base_url(url);
        }
        Some(client)
    }

    pub fn tavily_client(&self) -> Option<TavilyClient> {
        let mut client = TavilyClient::new(self.api_key(Provider::Tavily)?);
        if let Some(url) = self.tavily_base_url.as_deref() {
            client = client.with_base_url(url);
        }
        Some(client)
    }

    pub fn listen_addr(&self) -> &str {
        self.listen_addr.as_deref().unwrap_or(DEFAULT_LISTEN_ADDR)
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("draftly").join("config.json"))
    }
}
