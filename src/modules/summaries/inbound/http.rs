use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::shared::infrastructure::store::DateRange;
use crate::shell::envelope::{self, CurrentActor};
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct DailyQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub target_minutes: Option<i64>,
    #[serde(default)]
    pub include_gaps: bool,
}

#[derive(Deserialize)]
pub struct WeeklyQuery {
    pub reference_date: Option<NaiveDate>,
}

pub async fn daily(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Query(query): Query<DailyQuery>,
) -> Response {
    match state
        .daily_summary
        .handle(
            &actor,
            &user_id,
            DateRange::new(query.from, query.to),
            query.target_minutes,
            query.include_gaps,
        )
        .await
    {
        Ok(report) => envelope::ok(StatusCode::OK, report),
        Err(err) => envelope::failure(&err),
    }
}

pub async fn weekly(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(user_id): Path<String>,
    Query(query): Query<WeeklyQuery>,
) -> Response {
    match state
        .weekly_overview
        .handle(&actor, &user_id, query.reference_date)
        .await
    {
        Ok(overview) => envelope::ok(StatusCode::OK, overview),
        Err(err) => envelope::failure(&err),
    }
}
