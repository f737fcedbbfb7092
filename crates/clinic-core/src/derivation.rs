//! Derived-field computation.
//!
//! Every field that is a pure function of other stored fields is computed
//! here and nowhere else. The storage layer calls these synchronously inside
//! the mutating path, so a reader never observes a derived field that is
//! stale relative to its sources. The functions are total; rejecting invalid
//! sources (height <= 0, bad quantity sign) happens in [`crate::rules`]
//! before any of them run.

use chrono::{DateTime, Utc};

use crate::models::PaymentStatus;

/// Prefix for generated patient codes.
const PATIENT_CODE_PREFIX: &str = "PAT-";

/// Body mass index from weight in kilograms and height in centimeters.
///
/// Height is stored in centimeters and converted to meters here; this is the
/// single unit convention for the whole crate. Returns 0.0 when height is not
/// positive. Rounded to two decimals so the stored value is reproducible.
pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm <= 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    let raw = weight_kg / (height_m * height_m);
    (raw * 100.0).round() / 100.0
}

/// Outstanding amount on a bill.
pub fn due_cents(total_cents: i64, paid_cents: i64) -> i64 {
    total_cents - paid_cents
}

/// Extended amount of a bill line item.
pub fn line_amount_cents(quantity: i64, unit_price_cents: i64) -> i64 {
    quantity * unit_price_cents
}

/// Total cost of an inventory transaction. Quantity may be negative for
/// outbound movements; cost is always reported as a magnitude.
pub fn transaction_cost_cents(quantity: i64, unit_cost_cents: i64) -> i64 {
    quantity.abs() * unit_cost_cents
}

/// Whole days between admission and discharge, or admission and `now` for a
/// patient still in care. Calendar-day difference, not elapsed-hours / 24.
pub fn total_days(
    admitted_at: DateTime<Utc>,
    discharged_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> i64 {
    let end = discharged_at.unwrap_or(now);
    (end.date_naive() - admitted_at.date_naive()).num_days()
}

/// A room is occupied once its active-admission count reaches capacity.
pub fn is_occupied(current_occupancy: i64, capacity: i64) -> bool {
    current_occupancy >= capacity
}

/// Human-facing patient code, assigned once at creation and never recomputed.
///
/// Zero-padded to four digits; ids past 9999 widen rather than truncate.
pub fn patient_code(id: i64) -> String {
    format!("{}{:04}", PATIENT_CODE_PREFIX, id)
}

/// Payment status from the paid/total pair.
pub fn payment_status(total_cents: i64, paid_cents: i64) -> PaymentStatus {
    if paid_cents <= 0 {
        PaymentStatus::Unpaid
    } else if paid_cents < total_cents {
        PaymentStatus::PartiallyPaid
    } else {
        PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_converts_centimeters() {
        // 70 kg at 175 cm -> 70 / 1.75^2 = 22.857... -> 22.86
        assert_eq!(bmi(70.0, 175.0), 22.86);
    }

    #[test]
    fn test_bmi_zero_for_non_positive_height() {
        assert_eq!(bmi(70.0, 0.0), 0.0);
        assert_eq!(bmi(70.0, -12.0), 0.0);
    }

    #[test]
    fn test_due_cents() {
        assert_eq!(due_cents(10_000, 2_500), 7_500);
        assert_eq!(due_cents(10_000, 10_000), 0);
    }

    #[test]
    fn test_line_amount() {
        assert_eq!(line_amount_cents(3, 1_250), 3_750);
    }

    #[test]
    fn test_transaction_cost_uses_magnitude() {
        assert_eq!(transaction_cost_cents(4, 500), 2_000);
        assert_eq!(transaction_cost_cents(-4, 500), 2_000);
    }

    #[test]
    fn test_total_days_discharged() {
        let admitted = "2024-03-01T08:00:00Z".parse().unwrap();
        let discharged = "2024-03-04T10:30:00Z".parse().unwrap();
        let now = "2024-06-01T00:00:00Z".parse().unwrap();
        assert_eq!(total_days(admitted, Some(discharged), now), 3);
    }

    #[test]
    fn test_total_days_still_admitted_uses_now() {
        let admitted = "2024-03-01T23:00:00Z".parse().unwrap();
        let now = "2024-03-02T01:00:00Z".parse().unwrap();
        // Crosses midnight: one calendar day even though only two hours passed.
        assert_eq!(total_days(admitted, None, now), 1);
    }

    #[test]
    fn test_total_days_same_day_is_zero() {
        let admitted = "2024-03-01T08:00:00Z".parse().unwrap();
        let now = "2024-03-01T19:00:00Z".parse().unwrap();
        assert_eq!(total_days(admitted, None, now), 0);
    }

    #[test]
    fn test_is_occupied_at_capacity() {
        assert!(!is_occupied(1, 2));
        assert!(is_occupied(2, 2));
        assert!(is_occupied(3, 2));
    }

    #[test]
    fn test_patient_code_zero_padded() {
        assert_eq!(patient_code(7), "PAT-0007");
        assert_eq!(patient_code(1234), "PAT-1234");
        assert_eq!(patient_code(10000), "PAT-10000");
    }

    #[test]
    fn test_payment_status_partition() {
        assert_eq!(payment_status(10_000, 0), PaymentStatus::Unpaid);
        assert_eq!(payment_status(10_000, 1), PaymentStatus::PartiallyPaid);
        assert_eq!(payment_status(10_000, 9_999), PaymentStatus::PartiallyPaid);
        assert_eq!(payment_status(10_000, 10_000), PaymentStatus::Paid);
    }

    #[test]
    fn test_payment_status_zero_total() {
        // A zero-total bill with nothing paid is unpaid, not paid.
        assert_eq!(payment_status(0, 0), PaymentStatus::Unpaid);
    }
}
