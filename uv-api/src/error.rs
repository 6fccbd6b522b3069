use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uv_core::UvError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Uv(#[from] UvError),

    #[error("Not found")]
    NotFound,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Uv(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Uv(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "banner request failed");
        }
        (status, Json(ErrorBody { ok: false, error: self.to_string() })).into_response()
    }
}
