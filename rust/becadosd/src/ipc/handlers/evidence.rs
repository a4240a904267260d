use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_optional_str, get_required_str, identity, require_student, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{EvidenceStatus, Role};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

fn evidence_submit(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let description = get_required_str(params, "description")?;
    let hours = params
        .get("hours")
        .and_then(|v| v.as_f64())
        .filter(|h| h.is_finite() && *h > 0.0)
        .ok_or_else(|| HandlerErr::new("bad_params", "hours must be a positive number"))?;
    require_student(conn, &student_id)?;

    let evidence_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO evidences(id, student_id, description, hours, status, created_at)
         VALUES(?, ?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))",
        (
            &evidence_id,
            &student_id,
            &description,
            hours,
            EvidenceStatus::Pendiente.as_str(),
        ),
    )
    .map_err(|e| {
        HandlerErr::new("db_insert_failed", e.to_string())
            .with_details(json!({ "table": "evidences" }))
    })?;

    Ok(json!({ "evidenceId": evidence_id, "status": EvidenceStatus::Pendiente }))
}

fn evidence_review(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let evidence_id = get_required_str(params, "evidenceId")?;
    let actor_id = get_required_str(params, "actorId")?;
    let next = match get_required_str(params, "decision")?.as_str() {
        "approve" => EvidenceStatus::Aprobada,
        "reject" => EvidenceStatus::Rechazada,
        other => {
            return Err(HandlerErr::new(
                "bad_params",
                format!("decision must be approve or reject, got {}", other),
            ))
        }
    };

    let actor = identity(conn, &actor_id)?;
    if !actor.role.can_review_evidence() {
        return Err(HandlerErr::new(
            "forbidden",
            "only admins and area bosses review evidence",
        ));
    }

    let row: Option<(String, String, Option<String>)> = conn
        .query_row(
            "SELECT e.status, e.student_id, u.internship_area
             FROM evidences e
             JOIN users u ON u.id = e.student_id
             WHERE e.id = ?",
            [&evidence_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .map_err(HandlerErr::query)?;
    let Some((status, student_id, student_area)) = row else {
        return Err(HandlerErr::new("not_found", "evidence not found"));
    };

    // An admin bound to an area only reviews students of that area.
    if actor.role == Role::Admin {
        if let Some(area) = actor.internship_area.as_deref() {
            if student_area.as_deref() != Some(area) {
                return Err(HandlerErr::new(
                    "forbidden",
                    "student belongs to another internship area",
                )
                .with_details(json!({ "studentId": student_id })));
            }
        }
    }

    let status: EvidenceStatus = status.parse()?;
    if status != EvidenceStatus::Pendiente {
        return Err(HandlerErr::new(
            "invalid_state",
            format!("evidence already {}", status.as_str()),
        ));
    }

    conn.execute(
        "UPDATE evidences
         SET status = ?, reviewed_by = ?, reviewed_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
         WHERE id = ?",
        (next.as_str(), &actor.id, &evidence_id),
    )
    .map_err(|e| {
        HandlerErr::new("db_update_failed", e.to_string())
            .with_details(json!({ "table": "evidences" }))
    })?;

    Ok(json!({ "evidenceId": evidence_id, "status": next }))
}

fn evidence_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let mut stmt = conn
        .prepare(
            "SELECT id, description, hours, status, reviewed_by, created_at, reviewed_at
             FROM evidences
             WHERE student_id = ?
             ORDER BY rowid DESC",
        )
        .map_err(HandlerErr::query)?;
    let evidences = stmt
        .query_map([&student_id], |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "description": r.get::<_, String>(1)?,
                "hours": r.get::<_, f64>(2)?,
                "status": r.get::<_, String>(3)?,
                "reviewedBy": r.get::<_, Option<String>>(4)?,
                "createdAt": r.get::<_, Option<String>>(5)?,
                "reviewedAt": r.get::<_, Option<String>>(6)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;
    Ok(json!({ "evidences": evidences }))
}

fn approved_hours_for(conn: &Connection, student_id: &str) -> Result<f64, HandlerErr> {
    let mut stmt = conn
        .prepare("SELECT hours FROM evidences WHERE student_id = ? AND status = ?")
        .map_err(HandlerErr::query)?;
    let hours = stmt
        .query_map((student_id, EvidenceStatus::Aprobada.as_str()), |r| {
            r.get::<_, f64>(0)
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;
    Ok(calc::approved_hours(hours))
}

fn progress_get(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    require_student(conn, &student_id)?;
    let hours_required: f64 = conn
        .query_row(
            "SELECT hours_required FROM users WHERE id = ?",
            [&student_id],
            |r| r.get(0),
        )
        .map_err(HandlerErr::query)?;
    let current = approved_hours_for(conn, &student_id)?;
    let progress = calc::progress(current, hours_required)
        .map_err(|e| HandlerErr::from(e).with_details(json!({ "studentId": student_id })))?;
    Ok(json!({ "studentId": student_id, "progress": progress }))
}

fn progress_list(
    conn: &Connection,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let mut sql = String::from(
        "SELECT id, full_name, internship_area, hours_required FROM users WHERE role = ?",
    );
    let mut binds: Vec<Value> = vec![Value::Text(Role::Becado.as_str().to_string())];
    if let Some(area) = get_optional_str(params, "internshipArea") {
        sql.push_str(" AND internship_area = ?");
        binds.push(Value::Text(area));
    }
    sql.push_str(" ORDER BY rowid");

    let mut stmt = conn.prepare(&sql).map_err(HandlerErr::query)?;
    let students = stmt
        .query_map(params_from_iter(binds.iter()), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
                r.get::<_, f64>(3)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::query)?;

    let mut rows: Vec<serde_json::Value> = Vec::with_capacity(students.len());
    for (id, full_name, area, hours_required) in students {
        let current = approved_hours_for(conn, &id)?;
        let row = match calc::progress(current, hours_required) {
            Ok(p) => json!({
                "studentId": id,
                "fullName": full_name,
                "internshipArea": area,
                "currentHours": p.current_hours,
                "hoursRequired": p.hours_required,
                "percent": p.percent,
                "completed": p.completed,
            }),
            Err(e) => json!({
                "studentId": id,
                "fullName": full_name,
                "internshipArea": area,
                "currentHours": current,
                "hoursRequired": hours_required,
                "percent": null,
                "completed": false,
                "configurationError": e.to_string(),
            }),
        };
        rows.push(row);
    }
    Ok(json!({ "students": rows }))
}

fn with_conn(
    state: &mut AppState,
    req: &Request,
    f: fn(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "evidence.submit" => Some(with_conn(state, req, evidence_submit)),
        "evidence.review" => Some(with_conn(state, req, evidence_review)),
        "evidence.list" => Some(with_conn(state, req, evidence_list)),
        "progress.get" => Some(with_conn(state, req, progress_get)),
        "progress.list" => Some(with_conn(state, req, progress_list)),
        _ => None,
    }
}
