//! Room and admission models.

use serde::{Deserialize, Serialize};

/// Admission lifecycle status. Only `Active` admissions count toward room
/// occupancy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AdmissionStatus {
    Active,
    Discharged,
    Transferred,
    Deceased,
}

impl AdmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionStatus::Active => "Active",
            AdmissionStatus::Discharged => "Discharged",
            AdmissionStatus::Transferred => "Transferred",
            AdmissionStatus::Deceased => "Deceased",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Active" => Ok(AdmissionStatus::Active),
            "Discharged" => Ok(AdmissionStatus::Discharged),
            "Transferred" => Ok(AdmissionStatus::Transferred),
            "Deceased" => Ok(AdmissionStatus::Deceased),
            _ => Err(format!("unknown admission status '{}'", s)),
        }
    }
}

/// Input for creating a ward room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: Option<String>,
    pub capacity: i64,
}

/// A stored room. Occupancy and the occupied flag are derived from active
/// admissions and owned by the occupancy propagator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub room_type: Option<String>,
    pub capacity: i64,
    pub current_occupancy: i64,
    pub is_occupied: bool,
    pub is_active: bool,
}

/// Input for admitting a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAdmission {
    pub patient_id: i64,
    pub room_id: i64,
    pub attending_doctor_id: Option<i64>,
    /// RFC 3339; defaults to the store clock when absent.
    pub admitted_at: Option<String>,
    pub reason: Option<String>,
    pub recorded_by: Option<i64>,
}

/// Fields of an admission that may change after creation. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdmissionUpdate {
    pub room_id: Option<i64>,
    pub status: Option<AdmissionStatus>,
    /// RFC 3339 discharge instant.
    pub discharged_at: Option<String>,
    pub recorded_by: Option<i64>,
}

/// A stored admission with its derived duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Admission {
    pub id: i64,
    pub patient_id: i64,
    pub room_id: i64,
    pub attending_doctor_id: Option<i64>,
    pub admitted_at: String,
    pub discharged_at: Option<String>,
    /// Whole days admitted; up to "now" while still in care.
    pub total_days: i64,
    pub status: AdmissionStatus,
    pub reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
