use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use draftly_core::ai::gemini::NO_REPLY_PLACEHOLDER;
use draftly_core::ai::GenerateContentRequest;
use draftly_core::prompts::{compose_search_results, summarize_search_prompt};
use draftly_core::{AgentRequest, AgentResponse, ChatRequest, ChatResponse, Provider};

use crate::error::ApiError;
use crate::state::AppState;

type SharedState = Arc<AppState>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat).fallback(method_not_allowed))
        .route("/api/agent", post(agent).fallback(method_not_allowed))
        .with_state(Arc::new(state))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /api/chat - forward a conversation to Gemini and return its reply
async fn chat(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Some(gemini) = state.gemini.as_ref() else {
        tracing::warn!("chat request without a Gemini key");
        return Ok(Json(ChatResponse::reply(Provider::Gemini.missing_key_warning())));
    };

    let request = parse(payload)?;
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("messages must not be empty".to_string()));
    }

    let generate = GenerateContentRequest::from_messages(&request.messages);
    if generate.contents.is_empty() {
        return Err(ApiError::BadRequest(
            "messages must contain a user or assistant turn".to_string(),
        ));
    }

    tracing::info!(turns = request.messages.len(), model = gemini.model(), "forwarding chat");
    let response = gemini
        .generate(&generate)
        .await
        .map_err(ApiError::upstream("Gemini API request failed"))?;

    let reply = response.text().unwrap_or(NO_REPLY_PLACEHOLDER);
    Ok(Json(ChatResponse::reply(reply)))
}

/// POST /api/agent - search the web and summarize the results when possible
async fn agent(
    State(state): State<SharedState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<AgentResponse>, ApiError> {
    let Some(tavily) = state.tavily.as_ref() else {
        tracing::warn!("agent request without a Tavily key");
        return Ok(Json(AgentResponse {
            result: Provider::Tavily.missing_key_warning().to_string(),
        }));
    };

    let request = parse(payload)?;
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let search = tavily
        .search(&request.query)
        .await
        .map_err(ApiError::upstream("Agent failed"))?;
    tracing::info!(results = search.results().len(), "search finished");

    let Some(gemini) = state.gemini.as_ref() else {
        return Ok(Json(AgentResponse {
            result: compose_search_results(search.answer(), search.results()),
        }));
    };

    let prompt = summarize_search_prompt(&request.query, search.results());
    let summary = gemini
        .generate(&GenerateContentRequest::prompt(prompt))
        .await
        .map_err(ApiError::upstream("Agent failed"))?;

    let result = summary.text().unwrap_or(search.answer()).to_string();
    Ok(Json(AgentResponse { result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode, Uri},
    };
    use draftly_core::{GeminiClient, TavilyClient};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// A provider stand-in that records every request and answers with a fixed body.
    struct Stub {
        url: String,
        requests: Arc<Mutex<Vec<(String, Value)>>>,
    }

    impl Stub {
        async fn start(status: StatusCode, body: Value) -> Self {
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorded = requests.clone();
            let app = Router::new().fallback(move |uri: Uri, Json(req): Json<Value>| {
                let recorded = recorded.clone();
                let body = body.clone();
                async move {
                    recorded.lock().unwrap().push((uri.to_string(), req));
                    (status, Json(body))
                }
            });

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });
            Self { url, requests }
        }

        fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }

        fn gemini(&self) -> GeminiClient {
            GeminiClient::new("gemini-test-key").with_base_url(&self.url)
        }

        fn tavily(&self) -> TavilyClient {
            TavilyClient::new("tavily-test-key").with_base_url(&self.url)
        }
    }

    fn gemini_reply(text: &str) -> Value {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
    }

    fn search_reply() -> Value {
        json!({
            "answer": "Rust is a language.",
            "results": [
                { "title": "Rust", "url": "https://rust-lang.org", "snippet": "A language" },
                { "title": "Book", "url": "https://doc.rust-lang.org/book", "content": "The book" },
                { "title": "Crates", "url": "https://crates.io" }
            ]
        })
    }

    async fn send(state: AppState, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn post_json(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        send(state, Method::POST, uri, &body.to_string()).await
    }

    fn with_gemini(stub: &Stub) -> AppState {
        AppState {
            gemini: Some(stub.gemini()),
            tavily: None,
        }
    }

    #[tokio::test]
    async fn test_chat_returns_provider_text() {
        let gemini = Stub::start(StatusCode::OK, gemini_reply("T")).await;
        let body = json!({ "messages": [
            { "role": "assistant", "content": "Hi!" },
            { "role": "user", "content": "Summarize X" }
        ]});

        let (status, json) = post_json(with_gemini(&gemini), "/api/chat", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "reply": "T" }));

        let requests = gemini.requests();
        assert_eq!(requests.len(), 1);
        let (uri, sent) = &requests[0];
        assert!(uri.contains(":generateContent"));
        assert!(uri.contains("key=gemini-test-key"));
        assert_eq!(sent["contents"][0]["role"], "model");
        assert_eq!(sent["contents"][1]["role"], "user");
        assert_eq!(sent["contents"][1]["parts"][0]["text"], "Summarize X");
        assert!(sent.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn test_chat_lifts_system_turns() {
        let gemini = Stub::start(StatusCode::OK, gemini_reply("shorter")).await;
        let body = json!({ "messages": [
            { "role": "system", "content": "You are a helpful writing assistant." },
            { "role": "user", "content": "Shorten this" }
        ]});

        let (status, _) = post_json(with_gemini(&gemini), "/api/chat", body).await;
        assert_eq!(status, StatusCode::OK);

        let (_, sent) = &gemini.requests()[0];
        assert_eq!(
            sent["systemInstruction"]["parts"][0]["text"],
            "You are a helpful writing assistant."
        );
        assert_eq!(sent["contents"].as_array().unwrap().len(), 1);
        assert_eq!(sent["contents"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_chat_without_key_is_fail_soft() {
        for body in [
            json!({ "messages": [{ "role": "user", "content": "hello" }] }),
            json!({ "messages": [] }),
        ] {
            let (status, json) = post_json(AppState::default(), "/api/chat", body).await;
            assert_eq!(status, StatusCode::OK);
            assert!(json["reply"].as_str().unwrap().contains("GEMINI_API_KEY"));
        }
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_conversation() {
        let gemini = Stub::start(StatusCode::OK, gemini_reply("unused")).await;

        let (status, json) = post_json(with_gemini(&gemini), "/api/chat", json!({ "messages": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "messages must not be empty");

        let only_system = json!({ "messages": [{ "role": "system", "content": "persona" }] });
        let (status, _) = post_json(with_gemini(&gemini), "/api/chat", only_system).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(gemini.requests().is_empty());
    }

    #[tokio::test]
    async fn test_chat_placeholder_when_no_text() {
        let gemini = Stub::start(StatusCode::OK, json!({ "candidates": [] })).await;
        let body = json!({ "messages": [{ "role": "user", "content": "hello" }] });

        let (status, json) = post_json(with_gemini(&gemini), "/api/chat", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"], NO_REPLY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_chat_provider_failure_is_500() {
        let gemini = Stub::start(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": { "message": "overloaded" } }),
        )
        .await;
        let body = json!({ "messages": [{ "role": "user", "content": "hello" }] });

        let (status, json) = post_json(with_gemini(&gemini), "/api/chat", body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "error": "Gemini API request failed" }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let gemini = Stub::start(StatusCode::OK, gemini_reply("unused")).await;
        let (status, json) = send(with_gemini(&gemini), Method::POST, "/api/chat", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        for uri in ["/api/chat", "/api/agent"] {
            let request = Request::builder().method(Method::GET).uri(uri).body(Body::empty()).unwrap();
            let response = router(AppState::default()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[header::ALLOW], "POST");

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json, json!({ "error": "Method not allowed" }));
        }
    }

    #[tokio::test]
    async fn test_agent_without_search_key_is_fail_soft() {
        let (status, json) = post_json(AppState::default(), "/api/agent", json!({ "query": "rust" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["result"].as_str().unwrap().contains("TAVILY_API_KEY"));
    }

    #[tokio::test]
    async fn test_agent_without_gemini_lists_raw_results() {
        let tavily = Stub::start(StatusCode::OK, search_reply()).await;
        let state = AppState {
            gemini: None,
            tavily: Some(tavily.tavily()),
        };

        let (status, json) = post_json(state, "/api/agent", json!({ "query": "rust" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["result"],
            "Search results (no Gemini summary):\n\nRust is a language.\n\nTop links:\n\
             1. Rust - https://rust-lang.org\n\
             2. Book - https://doc.rust-lang.org/book\n\
             3. Crates - https://crates.io"
        );

        let (uri, sent) = &tavily.requests()[0];
        assert_eq!(uri, "/search");
        assert_eq!(
            sent,
            &json!({
                "api_key": "tavily-test-key",
                "query": "rust",
                "search_depth": "basic",
                "include_answer": true,
                "include_images": false,
                "include_raw_content": false,
                "max_results": 5
            })
        );
    }

    #[tokio::test]
    async fn test_agent_summarizes_with_gemini() {
        let tavily = Stub::start(StatusCode::OK, search_reply()).await;
        let gemini = Stub::start(StatusCode::OK, gemini_reply("- point\n\nSummary.")).await;
        let state = AppState {
            gemini: Some(gemini.gemini()),
            tavily: Some(tavily.tavily()),
        };

        let (status, json) = post_json(state, "/api/agent", json!({ "query": "rust" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["result"], "- point\n\nSummary.");

        let (_, sent) = &gemini.requests()[0];
        let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.starts_with("Query: rust\n\n"));
        assert!(prompt.contains("Title: Book\nSnippet: The book\nURL: https://doc.rust-lang.org/book"));
    }

    #[tokio::test]
    async fn test_agent_falls_back_to_answer() {
        let tavily = Stub::start(StatusCode::OK, search_reply()).await;
        let gemini = Stub::start(StatusCode::OK, json!({})).await;
        let state = AppState {
            gemini: Some(gemini.gemini()),
            tavily: Some(tavily.tavily()),
        };

        let (_, json) = post_json(state, "/api/agent", json!({ "query": "rust" })).await;
        assert_eq!(json["result"], "Rust is a language.");
    }

    #[tokio::test]
    async fn test_agent_search_failure_is_500() {
        let tavily = Stub::start(StatusCode::UNAUTHORIZED, json!({ "detail": "bad key" })).await;
        let state = AppState {
            gemini: None,
            tavily: Some(tavily.tavily()),
        };

        let (status, json) = post_json(state, "/api/agent", json!({ "query": "rust" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "error": "Agent failed" }));
    }
}
