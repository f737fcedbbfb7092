//! Property tests for the derivation functions.

use clinic_core::derivation;
use clinic_core::models::PaymentStatus;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_due_is_total_minus_paid(total in 0i64..1_000_000, paid_frac in 0i64..=100) {
        let paid = total * paid_frac / 100;
        let due = derivation::due_cents(total, paid);
        prop_assert_eq!(due, total - paid);
        prop_assert!(due >= 0);
    }

    #[test]
    fn prop_payment_status_partitions_paid_range(total in 1i64..1_000_000, paid_frac in 0i64..=100) {
        let paid = total * paid_frac / 100;
        let status = derivation::payment_status(total, paid);
        match status {
            PaymentStatus::Unpaid => prop_assert_eq!(paid, 0),
            PaymentStatus::PartiallyPaid => prop_assert!(paid > 0 && paid < total),
            PaymentStatus::Paid => prop_assert_eq!(paid, total),
        }
    }

    #[test]
    fn prop_line_amount_distributes(qty in 1i64..1_000, price in 0i64..100_000) {
        prop_assert_eq!(
            derivation::line_amount_cents(qty, price),
            qty * price
        );
        prop_assert_eq!(
            derivation::line_amount_cents(qty + 1, price) - derivation::line_amount_cents(qty, price),
            price
        );
    }

    #[test]
    fn prop_transaction_cost_sign_invariant(qty in -1_000i64..1_000, cost in 0i64..100_000) {
        let total = derivation::transaction_cost_cents(qty, cost);
        prop_assert!(total >= 0);
        prop_assert_eq!(total, derivation::transaction_cost_cents(-qty, cost));
    }

    #[test]
    fn prop_patient_code_format(id in 1i64..=9_999) {
        let code = derivation::patient_code(id);
        prop_assert_eq!(code.len(), 8);
        prop_assert!(code.starts_with("PAT-"));
        let parsed: i64 = code[4..].parse().unwrap();
        prop_assert_eq!(parsed, id);
    }

    #[test]
    fn prop_bmi_positive_and_monotone_in_weight(
        weight in 1.0f64..300.0,
        height in 50.0f64..250.0,
    ) {
        let value = derivation::bmi(weight, height);
        prop_assert!(value > 0.0);
        // Heavier at the same height never lowers BMI
        prop_assert!(derivation::bmi(weight + 10.0, height) >= value);
    }

    #[test]
    fn prop_bmi_zero_without_height(weight in 0.0f64..300.0, height in -100.0f64..=0.0) {
        prop_assert_eq!(derivation::bmi(weight, height), 0.0);
    }

    #[test]
    fn prop_occupancy_flag_matches_comparison(occupancy in 0i64..100, capacity in 1i64..100) {
        prop_assert_eq!(
            derivation::is_occupied(occupancy, capacity),
            occupancy >= capacity
        );
    }
}
