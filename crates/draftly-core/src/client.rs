use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProviderError, Result};
use crate::state::{AgentRequest, AgentResponse, ChatMessage, ChatRequest, ChatResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the draftly server's `/api/chat` and `/api/agent` routes.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        self.post("/api/chat", &ChatRequest { messages }).await
    }

    pub async fn agent(&self, query: &str) -> Result<AgentResponse> {
        let request = AgentRequest {
            query: query.to_string(),
        };
        self.post("/api/agent", &request).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "posting to draftly server");

        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_response("draftly server", response).await);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_new_builds_timed_client_and_trims_slash() {
        let client = ApiClient::new("http://127.0.0.1:3000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:3000");
    }

    #[tokio::test]
    async fn test_chat_posts_history_and_reads_reply() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(req): Json<ChatRequest>| async move {
                Json(serde_json::json!({
                    "reply": format!("{} turns", req.messages.len()),
                    "edit": "<p>new</p>"
                }))
            }),
        );
        let client = ApiClient::new(&serve(router).await).unwrap();

        let resp = client
            .chat(vec![ChatMessage::assistant("Hi!"), ChatMessage::user("Go")])
            .await
            .unwrap();
        assert_eq!(resp.reply, "2 turns");
        assert_eq!(resp.edit.as_deref(), Some("<p>new</p>"));
    }

    #[tokio::test]
    async fn test_server_error_status_is_an_error() {
        let router = Router::new().route(
            "/api/agent",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Agent failed" })),
                )
            }),
        );
        let client = ApiClient::new(&serve(router).await).unwrap();

        let err = client.agent("anything").await.unwrap_err();
        match err {
            ProviderError::Status { status, body, .. } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body.contains("Agent failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
