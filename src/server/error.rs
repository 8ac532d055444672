//! `SyncError` → HTTP response at the axum boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::SyncError;
use crate::model::Envelope;

#[derive(Debug)]
pub struct AppError(pub SyncError);

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Envelope {
            error: Some(self.0.to_string()),
            result: None,
        };
        (status, Json(body)).into_response()
    }
}
