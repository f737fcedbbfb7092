//! Vitals models.

use serde::{Deserialize, Serialize};

/// Source fields for a vitals reading. BMI is derived by the store and never
/// accepted from callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalsInput {
    pub appointment_id: i64,
    pub weight_kg: f64,
    /// Height in centimeters (the crate-wide unit convention).
    pub height_cm: f64,
    pub temperature_c: Option<f64>,
    pub heart_rate: Option<i64>,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
}

/// A stored vitals reading with its derived BMI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vitals {
    pub id: i64,
    pub appointment_id: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    /// kg / m², derived from weight and height on every write.
    pub bmi: f64,
    pub temperature_c: Option<f64>,
    pub heart_rate: Option<i64>,
    pub systolic: Option<i64>,
    pub diastolic: Option<i64>,
    pub recorded_at: String,
}
