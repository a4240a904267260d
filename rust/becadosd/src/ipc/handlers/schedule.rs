use crate::controller::ViewState;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::HandlerErr;
use crate::ipc::types::{AppState, Request};

fn parse_student_ids(params: &serde_json::Value) -> Result<Vec<String>, HandlerErr> {
    let Some(arr) = params.get("studentIds").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::new("bad_params", "missing studentIds"));
    };
    let mut ids: Vec<String> = Vec::with_capacity(arr.len());
    for v in arr {
        let Some(id) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(HandlerErr::new(
                "bad_params",
                "studentIds must be non-empty strings",
            ));
        };
        if !ids.iter().any(|x| x == id) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

fn handle_schedule_combined(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let student_ids = match parse_student_ids(&req.params) {
        Ok(v) => v,
        Err(error) => return error.response(&req.id),
    };

    let ticket = state.schedule.begin(student_ids);
    let fetched = db::fetch_schedule_inputs(conn, &ticket.student_ids);
    state.schedule.complete(&ticket, fetched);

    if let ViewState::Failed { message, .. } = state.schedule.state() {
        // Single aggregate failure; the last good view travels in details.
        return err(
            &req.id,
            "fetch_failed",
            message.clone(),
            Some(state.schedule.to_json()),
        );
    }
    ok(&req.id, state.schedule.to_json())
}

fn handle_schedule_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, state.schedule.to_json())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.combined" => Some(handle_schedule_combined(state, req)),
        "schedule.current" => Some(handle_schedule_current(state, req)),
        _ => None,
    }
}
