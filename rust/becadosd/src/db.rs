use crate::controller::FetchedSchedule;
use crate::model::{AvailabilitySlot, Identity, Role, StudentIdentity, Weekday};
use anyhow::Context;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

pub const DB_FILE_NAME: &str = "becados.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.to_string_lossy()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL,
            internship_area TEXT,
            hours_required REAL NOT NULL DEFAULT 0,
            created_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_role_area ON users(role, internship_area)",
        [],
    )?;

    // Slots are never edited in place; an edit is delete + insert.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_availability(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            day_of_week TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            created_at TEXT,
            FOREIGN KEY(student_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_availability_student ON student_availability(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS evidences(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL,
            description TEXT NOT NULL,
            hours REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'pendiente',
            reviewed_by TEXT,
            created_at TEXT,
            reviewed_at TEXT,
            FOREIGN KEY(student_id) REFERENCES users(id),
            FOREIGN KEY(reviewed_by) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_evidences_student ON evidences(student_id)",
        [],
    )?;

    Ok(conn)
}

pub fn resolve_identity(conn: &Connection, user_id: &str) -> anyhow::Result<Option<Identity>> {
    let row: Option<(String, String, Option<String>)> = conn
        .query_row(
            "SELECT id, role, internship_area FROM users WHERE id = ?",
            [user_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((id, role, internship_area)) = row else {
        return Ok(None);
    };
    let role: Role = role.parse()?;
    Ok(Some(Identity {
        id,
        role,
        internship_area,
    }))
}

/// Users and availability rows for a selection of students.
///
/// Students come back in the requested order (unknown ids dropped); slots in
/// insertion order, joined with the owner's name. Rows with a day name that
/// is not a known weekday are skipped.
pub fn fetch_schedule_inputs(
    conn: &Connection,
    student_ids: &[String],
) -> anyhow::Result<FetchedSchedule> {
    if student_ids.is_empty() {
        return Ok(FetchedSchedule::default());
    }
    let placeholders = vec!["?"; student_ids.len()].join(", ");

    let mut stmt = conn.prepare(&format!(
        "SELECT id, full_name FROM users WHERE id IN ({})",
        placeholders
    ))?;
    let found: HashMap<String, String> = stmt
        .query_map(params_from_iter(student_ids.iter()), |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<Result<_, _>>()
        .context("failed to load students")?;
    let mut students: Vec<StudentIdentity> = Vec::with_capacity(found.len());
    for id in student_ids {
        if students.iter().any(|s| &s.id == id) {
            continue;
        }
        if let Some(full_name) = found.get(id) {
            students.push(StudentIdentity {
                id: id.clone(),
                full_name: full_name.clone(),
            });
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT a.id, a.student_id, a.day_of_week, a.start_time, a.end_time
         FROM student_availability a
         JOIN users u ON u.id = a.student_id
         WHERE a.student_id IN ({})
         ORDER BY a.rowid",
        placeholders
    ))?;
    let rows = stmt
        .query_map(params_from_iter(student_ids.iter()), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to load availability")?;

    let mut slots = Vec::with_capacity(rows.len());
    for (id, student_id, day, start_time, end_time) in rows {
        match day.parse::<Weekday>() {
            Ok(day_of_week) => slots.push(AvailabilitySlot {
                id,
                student_id,
                day_of_week,
                start_time,
                end_time,
            }),
            Err(e) => tracing::warn!(slot_id = %id, error = %e, "skipping availability row"),
        }
    }

    Ok(FetchedSchedule { students, slots })
}
