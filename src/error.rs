use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{harness::HarnessSynthesisError, language::Language};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("no harness template for language {0}")]
    UnsupportedLanguage(Language),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnsupportedLanguage(_) => "unsupported_language",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedLanguage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(code = self.code(), error = %self, "request rejected");
        let body = Json(ErrorBody {
            error: self.code(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<HarnessSynthesisError> for ServiceError {
    fn from(err: HarnessSynthesisError) -> Self {
        match err {
            HarnessSynthesisError::UnsupportedLanguage(language) => {
                Self::UnsupportedLanguage(language)
            }
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}
