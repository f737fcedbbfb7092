//! Appointment models.

use serde::{Deserialize, Serialize};

/// Appointment lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "NoShow",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Scheduled" => Ok(AppointmentStatus::Scheduled),
            "Completed" => Ok(AppointmentStatus::Completed),
            "Cancelled" => Ok(AppointmentStatus::Cancelled),
            "NoShow" => Ok(AppointmentStatus::NoShow),
            _ => Err(format!("unknown appointment status '{}'", s)),
        }
    }
}

/// Input for scheduling an appointment.
///
/// `created_at` defaults to the store clock; importers replaying historical
/// rows may supply the original timestamp, which also exempts the row from
/// the past-date rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM, the slot within the day
    pub time: String,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

/// A stored appointment. The (doctor, date, time) slot is unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            AppointmentStatus::Scheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(AppointmentStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(AppointmentStatus::parse("No Show").is_err());
    }
}
