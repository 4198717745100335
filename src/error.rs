//! Crate-wide error taxonomy.
//!
//! `KernelError` enumerates the kinds from spec.md §7 — not type names, kinds
//! — each carrying a stable numeric code and an HTTP status, the way
//! `internal_transfer::api::map_error` and `gateway::types::response::
//! ApiError` do on the teacher side. All variants here are *operational*:
//! they carry a code, a human message and a suggested status. Anything that
//! does not fit one of these kinds is a programmer error and should
//! propagate as `anyhow::Error` up to the axum handler boundary, where it is
//! converted to `KernelError::Unexpected`.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::money::MoneyError;

pub mod error_codes {
    pub const VALIDATION: i32 = 1001;
    pub const NOT_FOUND: i32 = 1002;
    pub const FROZEN_ACCOUNT: i32 = 1003;
    pub const INSUFFICIENT_FUNDS: i32 = 1004;
    pub const FRAUD_BLOCKED: i32 = 1005;
    pub const BUSY: i32 = 1006;
    pub const CONCURRENT_MODIFICATION: i32 = 1007;
    pub const DEPENDENCY_UNAVAILABLE: i32 = 1008;
    pub const UNEXPECTED: i32 = 1099;
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account {0} is not active")]
    FrozenAccount(String),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("transfer blocked by fraud engine, score {score}")]
    FraudBlocked { score: i32, signals: Vec<String> },

    #[error("account busy, lock held by another transfer")]
    Busy,

    #[error("concurrent modification, retries exhausted")]
    ConcurrentModification,

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("internal error, trace {trace_id}")]
    Unexpected {
        trace_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl KernelError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            KernelError::Validation(_) => VALIDATION,
            KernelError::NotFound(_) => NOT_FOUND,
            KernelError::FrozenAccount(_) => FROZEN_ACCOUNT,
            KernelError::InsufficientFunds { .. } => INSUFFICIENT_FUNDS,
            KernelError::FraudBlocked { .. } => FRAUD_BLOCKED,
            KernelError::Busy => BUSY,
            KernelError::ConcurrentModification => CONCURRENT_MODIFICATION,
            KernelError::DependencyUnavailable(_) => DEPENDENCY_UNAVAILABLE,
            KernelError::Unexpected { .. } => UNEXPECTED,
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            KernelError::Validation(_) => StatusCode::BAD_REQUEST,
            KernelError::NotFound(_) => StatusCode::NOT_FOUND,
            KernelError::FrozenAccount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            KernelError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            KernelError::FraudBlocked { .. } => StatusCode::FORBIDDEN,
            KernelError::Busy => StatusCode::CONFLICT,
            KernelError::ConcurrentModification => StatusCode::CONFLICT,
            KernelError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            KernelError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unexpected(trace_id: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        KernelError::Unexpected {
            trace_id: trace_id.into(),
            source: source.into(),
        }
    }
}

impl From<MoneyError> for KernelError {
    fn from(err: MoneyError) -> Self {
        KernelError::Validation(err.to_string())
    }
}

impl From<sqlx::Error> for KernelError {
    fn from(err: sqlx::Error) -> Self {
        KernelError::unexpected("unknown", err)
    }
}

impl From<redis::RedisError> for KernelError {
    fn from(err: redis::RedisError) -> Self {
        KernelError::DependencyUnavailable(err.to_string())
    }
}

/// Wire envelope for every error response. Mirrors the teacher's
/// `ApiResponse<()>` shape (code/msg) plus the trace ID every failure must
/// carry per spec.md §7.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    pub trace_id: Option<String>,
}

impl IntoResponse for KernelError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        let code = self.code();
        let trace_id = match &self {
            KernelError::Unexpected { trace_id, .. } => Some(trace_id.clone()),
            _ => None,
        };
        let message = self.to_string();
        (
            status,
            Json(ErrorBody {
                code,
                message,
                trace_id,
            }),
        )
            .into_response()
    }
}

/// Every failure response carries the trace ID so the caller can include it
/// in support requests (spec.md §7) — `KernelError` alone only knows its own
/// trace ID for the `Unexpected` variant, so handlers attach the request's
/// trace ID at the response boundary with this wrapper.
pub struct TracedError(pub KernelError, pub String);

impl IntoResponse for TracedError {
    fn into_response(self) -> axum::response::Response {
        let TracedError(err, trace_id) = self;
        let status = err.http_status();
        let code = err.code();
        let message = err.to_string();
        (
            status,
            Json(ErrorBody {
                code,
                message,
                trace_id: Some(trace_id),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_stable_codes_and_status() {
        assert_eq!(
            KernelError::Validation("bad".into()).http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(KernelError::Busy.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            KernelError::ConcurrentModification.code(),
            error_codes::CONCURRENT_MODIFICATION
        );
        assert_eq!(
            KernelError::InsufficientFunds {
                required: 100,
                available: 50
            }
            .http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
