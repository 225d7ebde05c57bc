use thiserror::Error;

/// Failure talking to a third-party provider or to the draftly server.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Builds a `Status` error from a non-2xx response, keeping its body for the logs.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ProviderError::Status {
            service,
            status,
            body,
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
