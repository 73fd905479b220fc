use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::jwt::TokenError, state::AppState};

/// Every failure a handler can report. All of them end the request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    Conflict,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("Resource not found")]
    MalformedId(#[from] uuid::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::MalformedId(_) => StatusCode::NOT_FOUND,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::Unauthorized("Not authorized, invalid token")
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

/// Attached to error responses so [`render_errors`] can add diagnostics.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let report = ErrorReport {
            message: message.clone(),
            stack: format!("{:?}", self),
        };
        let mut response = (
            status,
            Json(ErrorBody {
                message,
                stack: None,
            }),
        )
            .into_response();
        response.extensions_mut().insert(report);
        response
    }
}

/// Terminal error responder: outside production, error bodies also carry
/// the debug rendering of the error under `stack`.
pub async fn render_errors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if state.config.environment.is_production() {
        return response;
    }
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let (mut parts, _body) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    (
        parts,
        Json(ErrorBody {
            message: report.message,
            stack: Some(report.stack),
        }),
    )
        .into_response()
}

/// Fallback for unmatched paths and for known paths hit with the wrong method.
/// Reports the full request path, including any nest prefix.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Not Found - {}", uri))
}
