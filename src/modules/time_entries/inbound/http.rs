use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::modules::time_entries::domain::TimeEntryStatus;
use crate::modules::time_entries::use_cases::create_entry::CreateTimeEntry;
use crate::modules::time_entries::use_cases::track_timer::{StartTimer, StopTimer};
use crate::modules::time_entries::use_cases::update_entry::TimeEntryPatch;
use crate::shared::core::errors::CoreError;
use crate::shared::infrastructure::store::DateRange;
use crate::shell::envelope::{self, CurrentActor};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct RangeQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl RangeQuery {
    fn into_range(self) -> DateRange {
        DateRange::new(self.from, self.to)
    }
}

#[derive(Deserialize)]
pub struct BulkIdsBody {
    pub ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct RejectBody {
    pub ids: Vec<String>,
    pub reason: String,
}

fn bad_json() -> Response {
    StatusCode::UNPROCESSABLE_ENTITY.into_response()
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<CreateTimeEntry>, JsonRejection>,
) -> Response {
    let Ok(Json(command)) = body else {
        return bad_json();
    };
    match state.create_entry.handle(&actor, command).await {
        Ok(entry) => envelope::ok(StatusCode::CREATED, entry),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<String>,
    body: Result<Json<TimeEntryPatch>, JsonRejection>,
) -> Response {
    let Ok(Json(patch)) = body else {
        return bad_json();
    };
    match state.update_entry.handle(&actor, &entry_id, patch).await {
        Ok(entry) => envelope::ok(StatusCode::OK, entry),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(entry_id): Path<String>,
) -> Response {
    match state.delete_entry.handle(&actor, &entry_id).await {
        Ok(()) => envelope::ok(StatusCode::OK, serde_json::json!({ "deleted": entry_id })),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_for_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Response {
    match state
        .list_entries
        .for_user(&actor, &user_id, query.into_range())
        .await
    {
        Ok(entries) => envelope::ok(StatusCode::OK, entries),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_for_project(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(project_id): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Response {
    match state
        .list_entries
        .for_project(&actor, &project_id, query.into_range())
        .await
    {
        Ok(entries) => envelope::ok(StatusCode::OK, entries),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn list_for_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(status): Path<String>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let Some(status) = TimeEntryStatus::parse(&status) else {
        return envelope::failure(&CoreError::Validation(vec![format!(
            "unknown time entry status: {status}"
        )]));
    };
    match state
        .list_entries
        .for_status(&actor, status, query.into_range())
        .await
    {
        Ok(entries) => envelope::ok(StatusCode::OK, entries),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn submit(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<BulkIdsBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return bad_json();
    };
    match state.submit_entries.handle(&actor, body.ids).await {
        Ok(outcome) => envelope::bulk(outcome),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn approve(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<BulkIdsBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return bad_json();
    };
    // Managers and admins answer to no higher authority, so their own
    // submitted entries are fair game.
    let allow_self = actor.role.can_manage();
    match state
        .approve_entries
        .handle(&actor, body.ids, allow_self)
        .await
    {
        Ok(outcome) => envelope::bulk(outcome),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn reject(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<RejectBody>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return bad_json();
    };
    let allow_self = actor.role.can_manage();
    match state
        .reject_entries
        .handle(&actor, body.ids, &body.reason, allow_self)
        .await
    {
        Ok(outcome) => envelope::bulk(outcome),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn start_timer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<StartTimer>, JsonRejection>,
) -> Response {
    let Ok(Json(command)) = body else {
        return bad_json();
    };
    match state.start_timer.handle(&actor, command).await {
        Ok(session) => envelope::ok(StatusCode::CREATED, session),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn stop_timer(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    body: Result<Json<StopTimer>, JsonRejection>,
) -> Response {
    let Ok(Json(command)) = body else {
        return bad_json();
    };
    match state.stop_timer.handle(&actor, command).await {
        Ok(entry) => envelope::ok(StatusCode::CREATED, entry),
        Err(err) => envelope::failure(&err),
    }
}

#[cfg(test)]
mod time_entries_http_tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::shell::http::router;
    use crate::shell::state::AppState;

    fn post(uri: &str, role: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .header("x-user-id", "user-1")
            .header("x-user-role", role)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn it_should_return_201_with_the_created_entry() {
        let app = router(AppState::in_memory());
        let body = r#"{"project_id":"proj-1","description":"Sprint work","date":"2026-03-02","duration_minutes":90}"#;

        let response = app.oneshot(post("/time-entries", "employee", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "draft");
        assert_eq!(json["data"]["user_id"], "user-1");
    }

    #[tokio::test]
    async fn it_should_return_422_on_invalid_json() {
        let app = router(AppState::in_memory());
        let response = app
            .oneshot(post("/time-entries", "employee", "not-json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn it_should_return_401_without_identity_headers() {
        let app = router(AppState::in_memory());
        let request = Request::post("/time-entries")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn it_should_return_403_when_an_employee_approves() {
        let app = router(AppState::in_memory());
        let response = app
            .oneshot(post("/time-entries/approve", "employee", r#"{"ids":["te-1"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn it_should_report_partial_bulk_submission_as_207() {
        let state = AppState::in_memory();
        let app = router(state.clone());

        let create = |desc: &str| {
            format!(
                r#"{{"project_id":"proj-1","description":"{desc}","date":"2026-03-02","duration_minutes":60}}"#
            )
        };
        let mut ids = Vec::new();
        for description in ["first", "second"] {
            let response = app
                .clone()
                .oneshot(post("/time-entries", "employee", &create(description)))
                .await
                .unwrap();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            ids.push(json["data"]["id"].as_str().unwrap().to_string());
        }

        let body = format!(r#"{{"ids":["{}","missing-id","{}"]}}"#, ids[0], ids[1]);
        let response = app
            .oneshot(post("/time-entries/submit", "employee", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"]["successful"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"]["failed"][0]["id"], "missing-id");
        assert_eq!(json["data"]["failed"][0]["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn it_should_conflict_on_a_second_timer_start() {
        let app = router(AppState::in_memory());
        let body = r#"{"project_id":"proj-1"}"#;

        let first = app
            .clone()
            .oneshot(post("/timer/start", "employee", body))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = app.oneshot(post("/timer/start", "employee", body)).await.unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn it_should_reject_unknown_status_segments() {
        let app = router(AppState::in_memory());
        let request = Request::get("/time-entries/status/bogus?from=2026-03-01&to=2026-03-31")
            .header("x-user-id", "manager-1")
            .header("x-user-role", "manager")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
