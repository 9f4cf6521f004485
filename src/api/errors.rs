use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::AuthError, db::StoreError, export::ExportError};

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = Json(json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

fn status_for(err: &anyhow::Error) -> StatusCode {
    if let Some(e) = err.downcast_ref::<StoreError>() {
        return store_status(e);
    }
    if let Some(e) = err.downcast_ref::<AuthError>() {
        return auth_status(e);
    }
    if let Some(e) = err.downcast_ref::<ExportError>() {
        return match e {
            ExportError::NoData | ExportError::NoColumns => StatusCode::UNPROCESSABLE_ENTITY,
            ExportError::Store(inner) => store_status(inner),
            ExportError::Xlsx(_) | ExportError::Io(_) | ExportError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::ConstraintViolation(_) => StatusCode::CONFLICT,
        StoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        StoreError::Auth(inner) => auth_status(inner),
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::UnknownSession => {
            StatusCode::UNAUTHORIZED
        }
        AuthError::AdminRequired => StatusCode::FORBIDDEN,
        AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
