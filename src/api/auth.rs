use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::json;

use super::AppState;

pub const INTERNAL_TOKEN_HEADER: &str = "X-Internal-Token";

fn presented_token(request: &Request) -> Option<&str> {
    let headers = request.headers();
    if let Some(token) = headers.get(INTERNAL_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token);
    }
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Guards internal routes when a token is configured; open otherwise.
pub async fn internal_token_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    if let Some(expected) = state.internal_token.as_deref().filter(|t| !t.is_empty()) {
        match presented_token(&request) {
            Some(token) if token == expected => {}
            Some(_) => {
                return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid internal token"}))));
            }
            None => {
                return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "Missing internal token"}))));
            }
        }
    }

    Ok(next.run(request).await)
}
