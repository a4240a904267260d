use crate::error::DomainError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_hours: f64,
    pub hours_required: f64,
    /// Unclamped `current / required`; drives `completed`.
    pub ratio: f64,
    /// Bar width, clamped to 0..=100.
    pub percent: f64,
    pub completed: bool,
}

pub fn progress(current_hours: f64, hours_required: f64) -> Result<Progress, DomainError> {
    if !hours_required.is_finite() || hours_required <= 0.0 {
        return Err(DomainError::Configuration(format!(
            "hours_required must be positive, got {}",
            hours_required
        )));
    }
    let current = if current_hours.is_finite() {
        current_hours
    } else {
        0.0
    };
    let ratio = current / hours_required;
    Ok(Progress {
        current_hours: current,
        hours_required,
        ratio,
        percent: (ratio * 100.0).clamp(0.0, 100.0),
        completed: current >= hours_required,
    })
}

/// Sum of approved evidence hours. Negative rows are ignored.
pub fn approved_hours<I>(hours: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    hours
        .into_iter()
        .filter(|h| h.is_finite() && *h > 0.0)
        .sum()
}
