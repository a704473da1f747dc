use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::infrastructure::store::StoreError;

/// Whole-call failures. Every variant maps to a stable wire code and an HTTP
/// status; none of them crash the process.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{message}")]
    InvalidState {
        code: &'static str,
        message: String,
    },

    #[error("{0}")]
    Forbidden(String),

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{message}")]
    Invariant {
        code: &'static str,
        message: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_state(code: &'static str, message: impl Into<String>) -> Self {
        CoreError::InvalidState {
            code,
            message: message.into(),
        }
    }

    pub fn invariant(code: &'static str, message: impl Into<String>) -> Self {
        CoreError::Invariant {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> String {
        match self {
            CoreError::NotFound { entity, .. } => {
                format!("{}_NOT_FOUND", entity.to_uppercase())
            }
            CoreError::InvalidState { code, .. } | CoreError::Invariant { code, .. } => {
                (*code).to_string()
            }
            CoreError::Forbidden(_) => "UNAUTHORIZED".to_string(),
            CoreError::Validation(_) => "VALIDATION_ERROR".to_string(),
            CoreError::Conflict(_) => "CONFLICT".to_string(),
            CoreError::Internal(_) => "INTERNAL_ERROR".to_string(),
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::InvalidState { .. }
            | CoreError::Validation(_)
            | CoreError::Invariant { .. } => StatusCode::BAD_REQUEST,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Violations collected across the whole input, not just the first.
    pub fn violations(items: Vec<String>) -> Result<(), Self> {
        if items.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(items))
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CoreError::Internal("record vanished mid-operation".into()),
            StoreError::AlreadyExists => CoreError::Conflict("duplicate id".into()),
            StoreError::ConditionFailed => {
                CoreError::Conflict("conflicting concurrent write, retry".into())
            }
            StoreError::Backend(msg) => CoreError::Internal(msg),
        }
    }
}

/// Per-item failures inside a bulk operation. These carry the wire codes the
/// callers key on; one item failing never aborts the rest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("time entry not found")]
    NotFound,

    #[error("entry status does not permit this transition")]
    AlreadySubmitted,

    #[error("actor may not act on this entry")]
    Unauthorized,

    #[error("description is required before submission")]
    MissingDescription,

    #[error("duration must be between 1 and 1440 minutes")]
    InvalidDuration,

    #[error("store failure: {0}")]
    Store(String),
}

impl ItemError {
    pub fn code(&self) -> &'static str {
        match self {
            ItemError::NotFound => "NOT_FOUND",
            ItemError::AlreadySubmitted => "ALREADY_SUBMITTED",
            ItemError::Unauthorized => "UNAUTHORIZED",
            ItemError::MissingDescription => "MISSING_DESCRIPTION",
            ItemError::InvalidDuration => "INVALID_DURATION",
            ItemError::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for ItemError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ItemError::NotFound,
            other => ItemError::Store(other.to_string()),
        }
    }
}
