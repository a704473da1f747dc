use axum::http::StatusCode;
use serde::Serialize;

use crate::shared::core::errors::ItemError;

/// Per-item outcome reporting for bulk transitions. Items succeed or fail
/// independently; the set is never applied atomically.
#[derive(Debug, Default, Serialize)]
pub struct BulkOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

#[derive(Debug, Serialize)]
pub struct ItemFailure {
    pub id: String,
    pub error: String,
    pub message: String,
}

impl BulkOutcome {
    pub fn record(&mut self, id: String, result: Result<(), ItemError>) {
        match result {
            Ok(()) => self.successful.push(id),
            Err(err) => self.failed.push(ItemFailure {
                id,
                error: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }

    /// all-success -> 200, partial -> 207, all-fail -> 400.
    pub fn http_status(&self) -> StatusCode {
        if self.failed.is_empty() {
            StatusCode::OK
        } else if self.successful.is_empty() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::MULTI_STATUS
        }
    }
}
