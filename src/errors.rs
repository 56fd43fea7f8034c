use crate::dates::DateError;
use crate::reconcile::ReconcileError;
use crate::session::SessionError;
use crate::store::StoreError;
use axum::http::StatusCode;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }
}

impl From<DateError> for AppError {
    fn from(err: DateError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Rejected(_) => StatusCode::BAD_REQUEST,
            StoreError::Transport(_) => StatusCode::BAD_GATEWAY,
            StoreError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Date(err) => err.into(),
            SessionError::Store(err) => err.into(),
        }
    }
}

/// The client only learns that the save failed; which cells landed is in the log.
impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        error!(applied = err.applied, "failed to save week: {}", err.source);
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: "failed to save week".to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
