use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::GeoError;

impl IntoResponse for GeoError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GeoError::Validation(_) => StatusCode::BAD_REQUEST,
            GeoError::Authentication(_) => StatusCode::UNAUTHORIZED,
            GeoError::NotFound(_) => StatusCode::NOT_FOUND,
            GeoError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }

        (status, Json(json!({"error": self.user_message()}))).into_response()
    }
}
