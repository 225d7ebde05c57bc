use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
pub const MAX_RESULTS: u32 = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    include_images: bool,
    include_raw_content: bool,
    max_results: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "content")]
    pub snippet: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<SearchResult>>,
}

impl SearchResponse {
    /// The inline answer, or an empty string
    pub fn answer(&self) -> &str {
        self.answer.as_deref().unwrap_or_default()
    }

    pub fn results(&self) -> &[SearchResult] {
        self.results.as_deref().unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Basic-depth search for up to five results with an inline answer.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: "basic",
            include_answer: true,
            include_images: false,
            include_raw_content: false,
            max_results: MAX_RESULTS,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response("Tavily", response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unexpected Tavily response shape");
            SearchResponse::default()
        }))
    }
}
