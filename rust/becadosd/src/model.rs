use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of week as stored in `student_availability.day_of_week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Lunes,
    Martes,
    #[serde(rename = "Miércoles")]
    Miercoles,
    Jueves,
    Viernes,
    #[serde(rename = "Sábado")]
    Sabado,
    Domingo,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Lunes,
        Weekday::Martes,
        Weekday::Miercoles,
        Weekday::Jueves,
        Weekday::Viernes,
        Weekday::Sabado,
        Weekday::Domingo,
    ];

    /// Days rendered by the combined schedule. Domingo is stored but never shown.
    pub const COMBINED_VIEW: [Weekday; 6] = [
        Weekday::Lunes,
        Weekday::Martes,
        Weekday::Miercoles,
        Weekday::Jueves,
        Weekday::Viernes,
        Weekday::Sabado,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Lunes => "Lunes",
            Weekday::Martes => "Martes",
            Weekday::Miercoles => "Miércoles",
            Weekday::Jueves => "Jueves",
            Weekday::Viernes => "Viernes",
            Weekday::Sabado => "Sábado",
            Weekday::Domingo => "Domingo",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Weekday::ALL
            .into_iter()
            .find(|d| d.as_str() == t)
            .ok_or_else(|| DomainError::UnknownWeekday(t.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Becado,
    Admin,
    JefeArea,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Becado => "becado",
            Role::Admin => "admin",
            Role::JefeArea => "jefe_area",
        }
    }

    /// Admins and area bosses review evidence.
    pub fn can_review_evidence(self) -> bool {
        matches!(self, Role::Admin | Role::JefeArea)
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "becado" => Ok(Role::Becado),
            "admin" => Ok(Role::Admin),
            "jefe_area" => Ok(Role::JefeArea),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Pendiente,
    Aprobada,
    Rechazada,
}

impl EvidenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceStatus::Pendiente => "pendiente",
            EvidenceStatus::Aprobada => "aprobada",
            EvidenceStatus::Rechazada => "rechazada",
        }
    }
}

impl FromStr for EvidenceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pendiente" => Ok(EvidenceStatus::Pendiente),
            "aprobada" => Ok(EvidenceStatus::Aprobada),
            "rechazada" => Ok(EvidenceStatus::Rechazada),
            other => Err(DomainError::UnknownEvidenceStatus(other.to_string())),
        }
    }
}

/// Resolved caller: who is acting, in which role, for which internship area.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
    pub internship_area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub id: String,
    pub full_name: String,
}

/// One weekly availability row. Times stay as stored; the aggregator parses them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilitySlot {
    pub id: String,
    pub student_id: String,
    pub day_of_week: Weekday,
    pub start_time: String,
    pub end_time: String,
}
