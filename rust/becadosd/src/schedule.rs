use crate::color;
use crate::error::DomainError;
use crate::model::{AvailabilitySlot, StudentIdentity, Weekday};
use chrono::{NaiveTime, Timelike};
use serde::Serialize;
use std::collections::HashMap;

pub const FIRST_BLOCK_HOUR: u32 = 6;
pub const LAST_BLOCK_END_HOUR: u32 = 21;

// Two-digit fields only; seconds stop at 59.
fn has_clock_shape(t: &str) -> bool {
    let b = t.as_bytes();
    let pair = |i: usize| b[i].is_ascii_digit() && b[i + 1].is_ascii_digit();
    match b.len() {
        5 => pair(0) && b[2] == b':' && pair(3),
        8 => pair(0) && b[2] == b':' && pair(3) && b[5] == b':' && pair(6) && b[6] <= b'5',
        _ => false,
    }
}

pub fn parse_time_minutes(raw: &str) -> Result<u32, DomainError> {
    let t = raw.trim();
    if !has_clock_shape(t) {
        return Err(DomainError::InvalidSlotFormat {
            value: raw.to_string(),
        });
    }
    let parsed = NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .map_err(|_| DomainError::InvalidSlotFormat {
            value: raw.to_string(),
        })?;
    Ok(parsed.hour() * 60 + parsed.minute())
}

pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Rejects unparseable times and `start >= end`.
pub fn validate_interval(start_time: &str, end_time: &str) -> Result<(u32, u32), DomainError> {
    let start = parse_time_minutes(start_time)?;
    let end = parse_time_minutes(end_time)?;
    if start >= end {
        return Err(DomainError::InvalidInterval {
            start: start_time.trim().to_string(),
            end: end_time.trim().to_string(),
        });
    }
    Ok((start, end))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBlock {
    pub start_minutes: u32,
    pub end_minutes: u32,
}

impl DisplayBlock {
    pub fn overlaps(&self, start_minutes: u32, end_minutes: u32) -> bool {
        start_minutes < self.end_minutes && end_minutes > self.start_minutes
    }

    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            format_minutes(self.start_minutes),
            format_minutes(self.end_minutes)
        )
    }
}

pub fn display_blocks() -> Vec<DisplayBlock> {
    (FIRST_BLOCK_HOUR..LAST_BLOCK_END_HOUR)
        .map(|h| DisplayBlock {
            start_minutes: h * 60,
            end_minutes: (h + 1) * 60,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub student_id: String,
    pub name: String,
    pub color: &'static str,
    pub tooltip: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCell {
    pub label: String,
    pub start: String,
    pub end: String,
    pub empty: bool,
    pub entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub day: Weekday,
    pub blocks: Vec<BlockCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidSlot {
    pub slot_id: String,
    pub student_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub days: Vec<DaySchedule>,
    pub invalid_slots: Vec<InvalidSlot>,
}

impl ScheduleView {
    #[cfg(test)]
    pub fn cell(&self, day: Weekday, start_hour: u32) -> Option<&BlockCell> {
        let start = format_minutes(start_hour * 60);
        self.days
            .iter()
            .find(|d| d.day == day)?
            .blocks
            .iter()
            .find(|b| b.start == start)
    }
}

struct ParsedSlot<'a> {
    slot: &'a AvailabilitySlot,
    name: &'a str,
    start: u32,
    end: u32,
}

pub fn compute_schedule(students: &[StudentIdentity], slots: &[AvailabilitySlot]) -> ScheduleView {
    let names: HashMap<&str, &str> = students
        .iter()
        .map(|s| (s.id.as_str(), s.full_name.as_str()))
        .collect();

    let mut parsed: Vec<ParsedSlot> = Vec::with_capacity(slots.len());
    let mut invalid_slots: Vec<InvalidSlot> = Vec::new();
    let mut unknown_students = 0usize;
    for slot in slots {
        let Some(&name) = names.get(slot.student_id.as_str()) else {
            unknown_students += 1;
            continue;
        };
        match (
            parse_time_minutes(&slot.start_time),
            parse_time_minutes(&slot.end_time),
        ) {
            (Ok(start), Ok(end)) => parsed.push(ParsedSlot {
                slot,
                name,
                start,
                end,
            }),
            (Err(e), _) | (_, Err(e)) => invalid_slots.push(InvalidSlot {
                slot_id: slot.id.clone(),
                student_id: slot.student_id.clone(),
                message: e.to_string(),
            }),
        }
    }

    if unknown_students > 0 {
        tracing::debug!(count = unknown_students, "skipped slots for students outside the selection");
    }
    if !invalid_slots.is_empty() {
        tracing::warn!(
            count = invalid_slots.len(),
            "excluded slots with malformed times from combined schedule"
        );
    }

    let blocks = display_blocks();
    let days = Weekday::COMBINED_VIEW
        .into_iter()
        .map(|day| DaySchedule {
            day,
            blocks: blocks
                .iter()
                .map(|block| {
                    let entries: Vec<ScheduleEntry> = parsed
                        .iter()
                        .filter(|p| p.slot.day_of_week == day && block.overlaps(p.start, p.end))
                        .map(|p| {
                            let start_time = format_minutes(p.start);
                            let end_time = format_minutes(p.end);
                            ScheduleEntry {
                                student_id: p.slot.student_id.clone(),
                                name: p.name.to_string(),
                                color: color::color_for(&p.slot.student_id),
                                tooltip: format!("{}: {} - {}", p.name, start_time, end_time),
                                start_time,
                                end_time,
                            }
                        })
                        .collect();
                    BlockCell {
                        label: block.label(),
                        start: format_minutes(block.start_minutes),
                        end: format_minutes(block.end_minutes),
                        empty: entries.is_empty(),
                        entries,
                    }
                })
                .collect(),
        })
        .collect();

    ScheduleView {
        days,
        invalid_slots,
    }
}
