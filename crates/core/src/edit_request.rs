//! Edit-request workflow: status values, transitions, and validation.
//!
//! A worker who has been refused a further edit can ask a supervisor for an
//! exception. A request is created `pendiente` and resolved exactly once to
//! `aprobado` or `rechazado`. Resolution is advisory: it never grants a lease
//! and never lifts the one-edit cap by itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

pub const STATUS_PENDIENTE: &str = "pendiente";
pub const STATUS_APROBADO: &str = "aprobado";
pub const STATUS_RECHAZADO: &str = "rechazado";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDIENTE, STATUS_APROBADO, STATUS_RECHAZADO];

/// Maximum length of the free-text `motivo`, in characters.
pub const MAX_MOTIVO_LEN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditRequestStatus {
    Pendiente,
    Aprobado,
    Rechazado,
}

impl EditRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EditRequestStatus::Pendiente => STATUS_PENDIENTE,
            EditRequestStatus::Aprobado => STATUS_APROBADO,
            EditRequestStatus::Rechazado => STATUS_RECHAZADO,
        }
    }

    pub fn is_resolved(self) -> bool {
        !matches!(self, EditRequestStatus::Pendiente)
    }
}

impl fmt::Display for EditRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_PENDIENTE => Ok(EditRequestStatus::Pendiente),
            STATUS_APROBADO => Ok(EditRequestStatus::Aprobado),
            STATUS_RECHAZADO => Ok(EditRequestStatus::Rechazado),
            other => Err(format!(
                "Invalid status '{other}'. Must be one of: {}",
                VALID_STATUSES.join(", ")
            )),
        }
    }
}

/// Parse a supervisor's decision. Only the two terminal statuses are accepted.
pub fn parse_resolution(value: &str) -> Result<EditRequestStatus, String> {
    let status: EditRequestStatus = value.parse()?;
    if !status.is_resolved() {
        return Err(format!(
            "Invalid status '{value}'. Must be one of: {STATUS_APROBADO}, {STATUS_RECHAZADO}"
        ));
    }
    Ok(status)
}

/// Normalize an optional `motivo`: trim it, drop it when blank, cap its length.
pub fn normalize_motivo(motivo: Option<&str>) -> Result<Option<String>, String> {
    let Some(motivo) = motivo.map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok(None);
    };
    let len = motivo.chars().count();
    if len > MAX_MOTIVO_LEN {
        return Err(format!(
            "motivo is {len} characters; maximum is {MAX_MOTIVO_LEN}"
        ));
    }
    Ok(Some(motivo.to_string()))
}

/// A worker's request for an exception to the one-edit cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRequest {
    pub id: DbId,
    pub record_id: DbId,
    pub requester_id: DbId,
    pub status: EditRequestStatus,
    pub motivo: Option<String>,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<DbId>,
}

/// Input for creating a request.
#[derive(Debug, Clone)]
pub struct NewEditRequest {
    pub record_id: DbId,
    pub requester_id: DbId,
    pub motivo: Option<String>,
    pub created_at: Timestamp,
}

/// A supervisor's one-shot resolution of a pending request.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub request_id: DbId,
    pub status: EditRequestStatus,
    pub resolved_by: DbId,
    pub resolved_at: Timestamp,
}

/// Filters for listing requests. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct EditRequestFilter {
    pub status: Option<EditRequestStatus>,
    pub record_id: Option<DbId>,
    pub requester_id: Option<DbId>,
}

impl EditRequestFilter {
    pub fn matches(&self, request: &EditRequest) -> bool {
        self.status.map_or(true, |s| s == request.status)
            && self.record_id.map_or(true, |r| r == request.record_id)
            && self.requester_id.map_or(true, |u| u == request.requester_id)
    }
}
