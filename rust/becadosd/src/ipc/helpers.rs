use crate::db;
use crate::error::DomainError;
use crate::ipc::error::err;
use crate::model::{Identity, Role};
use rusqlite::Connection;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn query(e: impl std::fmt::Display) -> Self {
        Self::new("db_query_failed", e.to_string())
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<DomainError> for HandlerErr {
    fn from(e: DomainError) -> Self {
        HandlerErr::new(e.code(), e.to_string())
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn identity(conn: &Connection, user_id: &str) -> Result<Identity, HandlerErr> {
    db::resolve_identity(conn, user_id)
        .map_err(HandlerErr::query)?
        .ok_or_else(|| HandlerErr::new("not_found", "user not found"))
}

/// Looks up a user that must be a becado.
pub fn require_student(conn: &Connection, student_id: &str) -> Result<Identity, HandlerErr> {
    let who = identity(conn, student_id)?;
    if who.role != Role::Becado {
        return Err(HandlerErr::new(
            "bad_params",
            format!("user {} is not a becado", student_id),
        ));
    }
    Ok(who)
}
