//! User and doctor models.

use serde::{Deserialize, Serialize};

/// Staff role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Receptionist,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Receptionist => "Receptionist",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Doctor" => Ok(Role::Doctor),
            "Nurse" => Ok(Role::Nurse),
            "Receptionist" => Ok(Role::Receptionist),
            _ => Err(format!(
                "unknown role '{}', expected Admin, Doctor, Nurse or Receptionist",
                s
            )),
        }
    }
}

/// Input for creating a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// A stored user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

/// Input for registering a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDoctor {
    pub user_id: i64,
    pub specialization: String,
    pub license_number: String,
    pub years_of_experience: i64,
}

/// A stored doctor record linked to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub license_number: String,
    pub years_of_experience: i64,
    pub is_active: bool,
}
