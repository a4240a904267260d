use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, identity, require_student, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::Weekday;
use crate::schedule::{parse_time_minutes, validate_interval};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn availability_add(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let day: Weekday = get_required_str(params, "dayOfWeek")?.parse()?;
    let start_time = get_required_str(params, "startTime")?;
    let end_time = get_required_str(params, "endTime")?;
    validate_interval(&start_time, &end_time)?;
    require_student(conn, &student_id)?;

    let slot_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO student_availability(id, student_id, day_of_week, start_time, end_time, created_at)
         VALUES(?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (&slot_id, &student_id, day.as_str(), &start_time, &end_time),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "student_availability" }))
    })?;

    Ok(json!({ "slotId": slot_id }))
}

fn availability_delete(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let slot_id = get_required_str(params, "slotId")?;
    let actor_id = get_required_str(params, "actorId")?;
    let actor = identity(conn, &actor_id)?;

    let owner: Option<String> = conn
        .query_row(
            "SELECT student_id FROM student_availability WHERE id = ?",
            [&slot_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(HandlerErr::query)?;
    let Some(owner) = owner else {
        return Err(HandlerErr::new("not_found", "slot not found"));
    };
    if owner != actor.id {
        return Err(HandlerErr::new(
            "forbidden",
            "only the owning student may delete a slot",
        ));
    }

    conn.execute("DELETE FROM student_availability WHERE id = ?", [&slot_id])
        .map_err(|e| {
            HandlerErr::new("db_delete_failed", e.to_string())
                .with_details(json!({ "table": "student_availability" }))
        })?;
    Ok(json!({ "ok": true }))
}

fn availability_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let mut stmt = conn
        .prepare(
            "SELECT id, day_of_week, start_time, end_time
             FROM student_availability
             WHERE student_id = ?
             ORDER BY rowid",
        )
        .map_err(HandlerErr::query)?;
    let mut rows = stmt
        .query_map([&student_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;

    // Unknown day names and malformed times sort last rather than failing the list.
    rows.sort_by_key(|(_, day, start, _)| {
        let day = day.parse::<Weekday>().ok();
        let start = parse_time_minutes(start).ok();
        (day.is_none(), day, start.is_none(), start)
    });

    let slots: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(id, day, start, end)| {
            json!({
                "id": id,
                "dayOfWeek": day,
                "startTime": start,
                "endTime": end
            })
        })
        .collect();
    Ok(json!({ "slots": slots }))
}

fn handle_availability_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match availability_add(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_availability_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match availability_delete(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_availability_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match availability_list(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "availability.add" => Some(handle_availability_add(state, req)),
        "availability.delete" => Some(handle_availability_delete(state, req)),
        "availability.list" => Some(handle_availability_list(state, req)),
        _ => None,
    }
}
