use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::state::{ChatMessage, ChatRole};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";

/// Shown in place of a reply when the response carries no text
pub const NO_REPLY_PLACEHOLDER: &str = "(no reply from Gemini)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeminiContent {
    pub role: &'static str,
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
}

impl GenerateContentRequest {
    /// Maps a draftly conversation onto Gemini's vocabulary.
    ///
    /// `assistant` turns become `model` turns. System turns are pulled out of
    /// the history and sent as the request's `systemInstruction`, joined by a
    /// blank line in the order they appeared.
    pub fn from_messages(messages: &[ChatMessage]) -> Self {
        let mut contents = Vec::with_capacity(messages.len());
        let mut system = Vec::new();

        for msg in messages {
            let role = match msg.role {
                ChatRole::System => {
                    system.push(msg.content.as_str());
                    continue;
                }
                ChatRole::Assistant => "model",
                ChatRole::User => "user",
            };
            contents.push(GeminiContent {
                role,
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            });
        }

        let system_instruction = (!system.is_empty()).then(|| SystemInstruction {
            parts: vec![GeminiPart {
                text: system.join("\n\n"),
            }],
        });

        Self {
            contents,
            system_instruction,
        }
    }

    /// A single user turn with no system instruction
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: text.into() }],
            }],
            system_instruction: None,
        }
    }
}

/// `generateContent` response. Every level may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Calls `generateContent`. A body that isn't the expected JSON decodes as
    /// an empty response rather than an error.
    pub async fn generate(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response("Gemini", response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "unexpected Gemini response shape");
            GenerateContentResponse::default()
        }))
    }
}
