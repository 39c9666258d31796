// src/web/response.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// `{status: "success", message, data?}` envelope shared by every handler.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: "success",
            message: message.into(),
            data: Some(data),
            code: StatusCode::OK,
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            code: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            status: "success",
            message: message.into(),
            data: None,
            code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(self)).into_response()
    }
}
