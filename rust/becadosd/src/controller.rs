use crate::model::{AvailabilitySlot, StudentIdentity};
use crate::schedule::{compute_schedule, ScheduleView};
use serde_json::json;

/// Rows returned by the store for one selection.
#[derive(Debug, Clone, Default)]
pub struct FetchedSchedule {
    pub students: Vec<StudentIdentity>,
    pub slots: Vec<AvailabilitySlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    NotLoaded,
    Loading {
        previous: Option<ScheduleView>,
    },
    Ready(ScheduleView),
    Failed {
        message: String,
        previous: Option<ScheduleView>,
    },
}

impl ViewState {
    pub fn status(&self) -> &'static str {
        match self {
            ViewState::NotLoaded => "not_loaded",
            ViewState::Loading { .. } => "loading",
            ViewState::Ready(_) => "ready",
            ViewState::Failed { .. } => "failed",
        }
    }

    fn last_good(&self) -> Option<&ScheduleView> {
        match self {
            ViewState::NotLoaded => None,
            ViewState::Ready(v) => Some(v),
            ViewState::Loading { previous } | ViewState::Failed { previous, .. } => {
                previous.as_ref()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub request_id: u64,
    pub student_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug)]
pub struct ScheduleController {
    latest_request: u64,
    selection: Vec<String>,
    state: ViewState,
}

impl Default for ScheduleController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleController {
    pub fn new() -> Self {
        Self {
            latest_request: 0,
            selection: Vec::new(),
            state: ViewState::NotLoaded,
        }
    }

    pub fn begin(&mut self, student_ids: Vec<String>) -> FetchTicket {
        self.latest_request += 1;
        let previous = self.state.last_good().cloned();
        self.state = ViewState::Loading { previous };
        self.selection = student_ids.clone();
        FetchTicket {
            request_id: self.latest_request,
            student_ids,
        }
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: anyhow::Result<FetchedSchedule>,
    ) -> Completion {
        if ticket.request_id != self.latest_request {
            tracing::debug!(
                request_id = ticket.request_id,
                latest = self.latest_request,
                "discarding stale schedule response"
            );
            return Completion::Stale;
        }
        let next = match result {
            Ok(fetched) => ViewState::Ready(compute_schedule(&fetched.students, &fetched.slots)),
            Err(e) => {
                tracing::warn!(request_id = ticket.request_id, error = %e, "schedule fetch failed");
                ViewState::Failed {
                    message: e.to_string(),
                    previous: self.state.last_good().cloned(),
                }
            }
        };
        self.state = next;
        Completion::Applied
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> Option<&ScheduleView> {
        self.state.last_good()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let error = match &self.state {
            ViewState::Failed { message, .. } => Some(message.clone()),
            _ => None,
        };
        json!({
            "requestId": self.latest_request,
            "status": self.state.status(),
            "studentIds": self.selection,
            "error": error,
            "view": self.view(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weekday;
    use anyhow::anyhow;

    fn fetched(name: &str, start: &str, end: &str) -> FetchedSchedule {
        FetchedSchedule {
            students: vec![StudentIdentity {
                id: "a".to_string(),
                full_name: name.to_string(),
            }],
            slots: vec![AvailabilitySlot {
                id: "s1".to_string(),
                student_id: "a".to_string(),
                day_of_week: Weekday::Lunes,
                start_time: start.to_string(),
                end_time: end.to_string(),
            }],
        }
    }

    #[test]
    fn starts_not_loaded() {
        let c = ScheduleController::new();
        assert_eq!(c.state().status(), "not_loaded");
        assert!(c.view().is_none());
    }

    #[test]
    fn latest_response_is_applied() {
        let mut c = ScheduleController::new();
        let t = c.begin(vec!["a".to_string()]);
        assert_eq!(c.state().status(), "loading");
        assert_eq!(c.complete(&t, Ok(fetched("Ana", "09:00", "10:00"))), Completion::Applied);
        assert_eq!(c.state().status(), "ready");
        let view = c.view().expect("view");
        assert!(!view.cell(Weekday::Lunes, 9).expect("cell").empty);
    }

    #[test]
    fn stale_response_does_not_overwrite_newer_one() {
        let mut c = ScheduleController::new();
        let old = c.begin(vec!["a".to_string()]);
        let new = c.begin(vec!["a".to_string()]);
        assert!(new.request_id > old.request_id);

        assert_eq!(c.complete(&new, Ok(fetched("Ana", "12:00", "13:00"))), Completion::Applied);
        assert_eq!(c.complete(&old, Ok(fetched("Ana", "09:00", "10:00"))), Completion::Stale);

        let view = c.view().expect("view");
        assert!(view.cell(Weekday::Lunes, 9).expect("cell").empty);
        assert!(!view.cell(Weekday::Lunes, 12).expect("cell").empty);
    }

    #[test]
    fn stale_response_while_loading_keeps_loading() {
        let mut c = ScheduleController::new();
        let old = c.begin(vec![]);
        let _new = c.begin(vec![]);
        assert_eq!(c.complete(&old, Ok(FetchedSchedule::default())), Completion::Stale);
        assert_eq!(c.state().status(), "loading");
    }

    #[test]
    fn failure_keeps_previous_view_and_reports_once() {
        let mut c = ScheduleController::new();
        let t1 = c.begin(vec!["a".to_string()]);
        c.complete(&t1, Ok(fetched("Ana", "09:00", "10:00")));

        let t2 = c.begin(vec!["a".to_string()]);
        assert!(c.view().is_some(), "previous view survives while loading");
        c.complete(&t2, Err(anyhow!("connection reset")));

        match c.state() {
            ViewState::Failed { message, previous } => {
                assert_eq!(message, "connection reset");
                assert!(previous.is_some());
            }
            other => panic!("expected failed state, got {:?}", other.status()),
        }
        assert!(!c.view().expect("view").cell(Weekday::Lunes, 9).expect("cell").empty);

        let json = c.to_json();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "connection reset");
    }

    #[test]
    fn failure_without_previous_view_has_no_view() {
        let mut c = ScheduleController::new();
        let t = c.begin(vec![]);
        c.complete(&t, Err(anyhow!("boom")));
        assert!(c.view().is_none());
        assert!(c.to_json()["view"].is_null());
    }
}
