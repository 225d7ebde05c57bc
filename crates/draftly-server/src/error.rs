use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use draftly_core::ProviderError;
use thiserror::Error;

/// Errors an endpoint reports to its caller. Every variant renders as
/// `{ "error": <message> }`; upstream detail only goes to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("{public}")]
    Upstream {
        public: &'static str,
        #[source]
        source: ProviderError,
    },
}

impl ApiError {
    pub fn upstream(public: &'static str) -> impl FnOnce(ProviderError) -> Self {
        move |source| ApiError::Upstream { public, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Upstream { public, source } = &self {
            tracing::error!(error = %source, "{public}");
        }

        let status = self.status();
        let mut response = (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}
