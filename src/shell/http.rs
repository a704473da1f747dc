use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::modules::invoices::inbound::http as invoices_http;
use crate::modules::summaries::inbound::http as summaries_http;
use crate::modules::time_entries::inbound::http as time_entries_http;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/time-entries", post(time_entries_http::create))
        .route(
            "/time-entries/submit",
            post(time_entries_http::submit),
        )
        .route(
            "/time-entries/approve",
            post(time_entries_http::approve),
        )
        .route(
            "/time-entries/reject",
            post(time_entries_http::reject),
        )
        .route(
            "/time-entries/user/{user_id}",
            get(time_entries_http::list_for_user),
        )
        .route(
            "/time-entries/project/{project_id}",
            get(time_entries_http::list_for_project),
        )
        .route(
            "/time-entries/status/{status}",
            get(time_entries_http::list_for_status),
        )
        .route(
            "/time-entries/{id}",
            patch(time_entries_http::update).delete(time_entries_http::delete),
        )
        .route("/timer/start", post(time_entries_http::start_timer))
        .route("/timer/stop", post(time_entries_http::stop_timer))
        .route("/invoices", post(invoices_http::create))
        .route(
            "/invoices/client/{client_id}",
            get(invoices_http::list_by_client),
        )
        .route(
            "/invoices/status/{status}",
            get(invoices_http::list_by_status),
        )
        .route(
            "/invoices/{id}",
            get(invoices_http::get).patch(invoices_http::update),
        )
        .route("/invoices/{id}/status", post(invoices_http::set_status))
        .route(
            "/invoices/{id}/payments",
            post(invoices_http::record_payment).get(invoices_http::list_payments),
        )
        .route("/summaries/daily/{user_id}", get(summaries_http::daily))
        .route("/summaries/weekly/{user_id}", get(summaries_http::weekly))
        .with_state(state)
}
