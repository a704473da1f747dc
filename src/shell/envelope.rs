use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::shared::core::auth::{Actor, Role};
use crate::shared::core::bulk::BulkOutcome;
use crate::shared::core::errors::CoreError;

/// `{"success": true, "data": ...}` on the happy path.
pub fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// `{"success": false, "error": CODE, "message": ...}` on failure.
pub fn failure(err: &CoreError) -> Response {
    (
        err.http_status(),
        Json(json!({
            "success": false,
            "error": err.code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}

/// Bulk outcomes keep the envelope and fold the per-item results into the
/// status: 200 all-success, 207 partial, 400 all-fail.
pub fn bulk(outcome: BulkOutcome) -> Response {
    let status = outcome.http_status();
    let success = !outcome.successful.is_empty();
    (
        status,
        Json(json!({ "success": success, "data": outcome })),
    )
        .into_response()
}

/// Caller identity taken from the `x-user-id` and `x-user-role` headers.
/// An upstream gateway is trusted to have authenticated them.
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| unauthenticated("missing x-user-id header"))?;
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(Role::parse)
            .ok_or_else(|| unauthenticated("missing or unknown x-user-role header"))?;
        Ok(CurrentActor(Actor::new(user_id, role)))
    }
}

fn unauthenticated(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "error": "UNAUTHENTICATED",
            "message": message,
        })),
    )
        .into_response()
}
