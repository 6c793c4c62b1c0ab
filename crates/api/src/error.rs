use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inspecta_core::error::{CoreError, EditDenial};
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses:
///
/// ```text
/// { "error": "<message>", "code": "<CODE>", "details": { ... } }
/// ```
///
/// `details` is only present for edit denials that carry blocking values
/// (lease holder, photo counts, request ids).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `inspecta_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body that failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                ),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
                }
                CoreError::Forbidden(msg) => {
                    (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None)
                }
                CoreError::Edit(denial) => (
                    denial_status(denial),
                    denial.code(),
                    denial.to_string(),
                    denial_details(denial),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
                CoreError::Store(err) => {
                    tracing::error!(error = ?err, "Store error");
                    internal()
                }
            },

            // --- HTTP-specific errors ---
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                errors.to_string(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String, Option<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
        None,
    )
}

/// HTTP status for an edit denial.
///
/// Contention with another principal or another resolution is a conflict;
/// payload-level invariant breaches are bad requests; everything else is a
/// refusal to this principal.
fn denial_status(denial: &EditDenial) -> StatusCode {
    match denial {
        EditDenial::LeaseHeld { .. } | EditDenial::RequestAlreadyResolved { .. } => {
            StatusCode::CONFLICT
        }
        EditDenial::PhotoLimitExceeded { .. } | EditDenial::RequestAlreadyPending { .. } => {
            StatusCode::BAD_REQUEST
        }
        EditDenial::EditWindowExpired { .. }
        | EditDenial::CredentialRequired
        | EditDenial::InvalidCredential
        | EditDenial::NotLeaseOwner
        | EditDenial::WorkerEditUsed
        | EditDenial::SupervisorRequired => StatusCode::FORBIDDEN,
    }
}

fn denial_details(denial: &EditDenial) -> Option<Value> {
    match denial {
        EditDenial::LeaseHeld {
            holder_id,
            holder_name,
            expires_at,
        } => Some(json!({
            "holder_id": holder_id,
            "holder_name": holder_name,
            "expires_at": expires_at,
        })),
        EditDenial::EditWindowExpired { expires_at } => Some(json!({ "expires_at": expires_at })),
        EditDenial::PhotoLimitExceeded {
            current,
            attempted,
            max,
        } => Some(json!({
            "current": current,
            "attempted": attempted,
            "max": max,
        })),
        EditDenial::RequestAlreadyPending { request_id } => {
            Some(json!({ "request_id": request_id }))
        }
        EditDenial::RequestAlreadyResolved { request_id, status } => Some(json!({
            "request_id": request_id,
            "status": status,
        })),
        EditDenial::CredentialRequired
        | EditDenial::InvalidCredential
        | EditDenial::NotLeaseOwner
        | EditDenial::WorkerEditUsed
        | EditDenial::SupervisorRequired => None,
    }
}
