use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde_json::json;
use uuid::Uuid;

fn users_create(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let full_name = get_required_str(params, "fullName")?;
    let role: Role = get_required_str(params, "role")?.parse()?;
    let internship_area = get_optional_str(params, "internshipArea");
    let hours_required = match params.get("hoursRequired") {
        None | Some(serde_json::Value::Null) => 0.0,
        Some(v) => v
            .as_f64()
            .filter(|h| h.is_finite() && *h >= 0.0)
            .ok_or_else(|| {
                HandlerErr::new("bad_params", "hoursRequired must be a non-negative number")
            })?,
    };

    let user_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO users(id, full_name, role, internship_area, hours_required, created_at)
         VALUES(?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (
            &user_id,
            &full_name,
            role.as_str(),
            internship_area.as_deref(),
            hours_required,
        ),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string()).with_details(json!({ "table": "users" }))
    })?;

    Ok(json!({ "userId": user_id }))
}

fn users_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let mut sql = String::from(
        "SELECT id, full_name, role, internship_area, hours_required FROM users WHERE 1 = 1",
    );
    let mut binds: Vec<Value> = Vec::new();
    if let Some(role) = get_optional_str(params, "role") {
        let role: Role = role.parse()?;
        sql.push_str(" AND role = ?");
        binds.push(Value::Text(role.as_str().to_string()));
    }
    if let Some(area) = get_optional_str(params, "internshipArea") {
        sql.push_str(" AND internship_area = ?");
        binds.push(Value::Text(area));
    }
    sql.push_str(" ORDER BY rowid");

    let mut stmt = conn.prepare(&sql).map_err(HandlerErr::query)?;
    let users = stmt
        .query_map(params_from_iter(binds.iter()), |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "fullName": r.get::<_, String>(1)?,
                "role": r.get::<_, String>(2)?,
                "internshipArea": r.get::<_, Option<String>>(3)?,
                "hoursRequired": r.get::<_, f64>(4)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;

    Ok(json!({ "users": users }))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match users_create(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match users_list(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.create" => Some(handle_users_create(state, req)),
        "users.list" => Some(handle_users_list(state, req)),
        _ => None,
    }
}
