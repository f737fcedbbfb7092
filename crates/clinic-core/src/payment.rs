//! Atomic payment recording.
//!
//! The one compound operation in the crate: validate, mutate the bill,
//! re-derive its payment fields, and append an audit entry, committed as a
//! single unit. The transaction is opened IMMEDIATE, so two concurrent
//! payments against the same bill serialize at the store instead of both
//! validating against a stale paid amount. Any failure after validation
//! rolls back both the bill update and the log write.

use rusqlite::OptionalExtension;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, Database, DbError};
use crate::derivation;
use crate::models::{PaymentMethod, PaymentStatus};

/// Payment errors.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("bill {0} not found")]
    BillNotFound(i64),

    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("payment of {attempted} would exceed bill total {total} (already paid {paid})")]
    Overpayment {
        attempted: i64,
        paid: i64,
        total: i64,
    },

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<rusqlite::Error> for PaymentError {
    fn from(e: rusqlite::Error) -> Self {
        PaymentError::Storage(DbError::Sqlite(e))
    }
}

pub type PaymentResult<T> = Result<T, PaymentError>;

/// A payment to record against a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub bill_id: i64,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// User recording the payment, written to the audit entry.
    pub recorded_by: i64,
}

/// Confirmation of a recorded payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    /// Generated reference for this payment, also present in the audit entry.
    pub reference: String,
    pub bill_id: i64,
    pub amount_cents: i64,
    /// Paid amount after this payment.
    pub paid_cents: i64,
    /// Outstanding amount after this payment.
    pub due_cents: i64,
    pub status: PaymentStatus,
}

/// Record a payment against a bill.
///
/// Steps, all inside one IMMEDIATE transaction:
/// 1. the bill must exist;
/// 2. the new paid amount may not exceed the total (the error reports the
///    attempted, already-paid and total amounts);
/// 3. the bill's paid amount, due amount, payment status and method are
///    updated together;
/// 4. one audit entry describing the payment is appended.
///
/// A rejected payment leaves the bill and the log exactly as they were.
pub fn record_payment(db: &mut Database, req: &PaymentRequest) -> PaymentResult<PaymentReceipt> {
    if req.amount_cents <= 0 {
        return Err(PaymentError::NonPositiveAmount(req.amount_cents));
    }
    let now = db.now();

    let tx = db.transaction().map_err(PaymentError::Storage)?;

    let row: Option<(i64, i64)> = tx
        .query_row(
            "SELECT paid_cents, total_cents FROM bills WHERE id = ?",
            [req.bill_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (paid, total) = row.ok_or(PaymentError::BillNotFound(req.bill_id))?;

    if paid + req.amount_cents > total {
        return Err(PaymentError::Overpayment {
            attempted: req.amount_cents,
            paid,
            total,
        });
    }

    let new_paid = paid + req.amount_cents;
    let due = derivation::due_cents(total, new_paid);
    let status = derivation::payment_status(total, new_paid);

    tx.execute(
        r#"
        UPDATE bills SET
            paid_cents = ?2,
            due_cents = ?3,
            payment_status = ?4,
            payment_method = ?5
        WHERE id = ?1
        "#,
        rusqlite::params![
            req.bill_id,
            new_paid,
            due,
            status.as_str(),
            req.method.as_str(),
        ],
    )?;

    let reference = Uuid::new_v4().to_string();
    db::append_entry(
        &tx,
        now,
        Some(req.recorded_by),
        "payment.recorded",
        json!({
            "reference": reference,
            "bill_id": req.bill_id,
            "amount_cents": req.amount_cents,
            "method": req.method.as_str(),
            "paid_cents": new_paid,
            "status": status.as_str(),
        }),
    )
    .map_err(PaymentError::Storage)?;

    tx.commit().map_err(PaymentError::from)?;

    Ok(PaymentReceipt {
        reference,
        bill_id: req.bill_id,
        amount_cents: req.amount_cents,
        paid_cents: new_paid,
        due_cents: due,
        status,
    })
}
