use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use tracing::error;

use super::models::ErrorResponse;

pub(crate) const GENERIC_ERROR_MESSAGE: &str = "Error processing the request";
pub(crate) const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Provider stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Transcription,
    Translation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Transcription => f.write_str("transcription"),
            Stage::Translation => f.write_str("translation"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("failed to parse multipart body: {0}")]
    Parse(String),
    #[error("malformed upload: {0}")]
    MalformedUpload(&'static str),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("failed to buffer upload: {0}")]
    Storage(#[from] std::io::Error),
    #[error("{stage} provider failed: {source:#}")]
    Provider {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl ServerError {
    pub(crate) fn parse(err: impl fmt::Display) -> Self {
        ServerError::Parse(err.to_string())
    }

    pub(crate) fn provider(stage: Stage) -> impl FnOnce(anyhow::Error) -> Self {
        move |source| ServerError::Provider { stage, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // clients expect 404 here, not 405
            ServerError::MethodNotAllowed => StatusCode::NOT_FOUND,
            ServerError::MissingField(_) => StatusCode::BAD_REQUEST,
            ServerError::Parse(_)
            | ServerError::MalformedUpload(_)
            | ServerError::Storage(_)
            | ServerError::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServerError::MethodNotAllowed => (status, METHOD_NOT_ALLOWED_MESSAGE).into_response(),
            ServerError::MissingField(_) => {
                let message = self.to_string();
                (status, Json(ErrorResponse { message })).into_response()
            }
            _ => {
                error!(error = %self, "request failed");
                (
                    status,
                    Json(ErrorResponse {
                        message: GENERIC_ERROR_MESSAGE.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_of(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn method_not_allowed_is_plain_text_404() {
        let response = ServerError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(
            response.headers()[axum::http::header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert_eq!(body_of(response).await, "Method not allowed");
    }

    #[tokio::test]
    async fn provider_errors_do_not_leak_details() {
        let err = ServerError::Provider {
            stage: Stage::Transcription,
            source: anyhow!("OpenAI API error (401): Incorrect API key provided: sk-abc"),
        };
        assert!(err.to_string().starts_with("transcription provider failed"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body, r#"{"message":"Error processing the request"}"#);
    }

    #[tokio::test]
    async fn parse_and_upload_errors_are_generic_500() {
        for err in [
            ServerError::parse("unexpected end of stream at boundary"),
            ServerError::MalformedUpload("audio field repeated"),
            ServerError::Storage(std::io::Error::other("disk full")),
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = body_of(response).await;
            assert!(!body.contains("boundary"));
            assert!(!body.contains("repeated"));
            assert!(!body.contains("disk"));
        }
    }

    #[tokio::test]
    async fn missing_field_is_400_with_field_name() {
        let response = ServerError::MissingField("targetLanguage").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            r#"{"message":"missing required field: targetLanguage"}"#
        );
    }
}
