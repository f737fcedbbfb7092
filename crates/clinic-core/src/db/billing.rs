//! Bill and bill item database operations.
//!
//! Due amount and payment status are derived here on creation; afterwards
//! they change only through the payment transaction in [`crate::payment`].

use rusqlite::{params, OptionalExtension};

use super::{map_write_err, Database, DbError, DbResult};
use crate::derivation;
use crate::models::{Bill, BillItem, NewBill, NewBillItem, PaymentMethod, PaymentStatus, ServiceType};
use crate::rules;

impl Database {
    /// Open a bill against exactly one of an appointment or an admission.
    pub fn create_bill(&self, new: &NewBill) -> DbResult<Bill> {
        rules::check_bill_reference(new.appointment_id, new.admission_id)?;
        rules::check_non_negative("bill.total", new.total_cents)?;
        rules::check_non_negative("bill.paid", new.paid_cents)?;
        rules::check_paid_within_total(new.paid_cents, new.total_cents)?;

        let due = derivation::due_cents(new.total_cents, new.paid_cents);
        let status = derivation::payment_status(new.total_cents, new.paid_cents);
        let bill_date = self.now().to_rfc3339();

        self.conn
            .execute(
                r#"
                INSERT INTO bills (
                    appointment_id, admission_id, bill_date, total_cents,
                    paid_cents, due_cents, payment_status, created_by
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    new.appointment_id,
                    new.admission_id,
                    bill_date,
                    new.total_cents,
                    new.paid_cents,
                    due,
                    status.as_str(),
                    new.created_by,
                ],
            )
            .map_err(|e| map_write_err(e, "bill"))?;

        let id = self.conn.last_insert_rowid();
        self.get_bill(id)?
            .ok_or_else(|| DbError::NotFound(format!("bill {}", id)))
    }

    /// Get a bill by id.
    pub fn get_bill(&self, id: i64) -> DbResult<Option<Bill>> {
        self.conn
            .query_row(
                r#"
                SELECT id, appointment_id, admission_id, bill_date, total_cents,
                       paid_cents, due_cents, payment_status, payment_method, created_by
                FROM bills
                WHERE id = ?
                "#,
                [id],
                bill_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Add a line item to a bill. The extended amount is derived.
    pub fn add_bill_item(&self, new: &NewBillItem) -> DbResult<BillItem> {
        rules::check_line_item(new.quantity, new.unit_price_cents)?;
        let amount = derivation::line_amount_cents(new.quantity, new.unit_price_cents);

        self.conn
            .execute(
                r#"
                INSERT INTO bill_items (
                    bill_id, service_type, description, quantity,
                    unit_price_cents, amount_cents, medicine_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    new.bill_id,
                    new.service_type.as_str(),
                    new.description,
                    new.quantity,
                    new.unit_price_cents,
                    amount,
                    new.medicine_id,
                ],
            )
            .map_err(|e| map_write_err(e, "bill item"))?;

        let id = self.conn.last_insert_rowid();
        self.get_bill_item(id)?
            .ok_or_else(|| DbError::NotFound(format!("bill item {}", id)))
    }

    /// Get a bill item by id.
    pub fn get_bill_item(&self, id: i64) -> DbResult<Option<BillItem>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_BILL_ITEM),
                [id],
                bill_item_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List the line items of a bill.
    pub fn list_bill_items(&self, bill_id: i64) -> DbResult<Vec<BillItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE bill_id = ? ORDER BY id", SELECT_BILL_ITEM))?;

        let rows = stmt.query_map([bill_id], bill_item_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(BillItem::try_from(row?)?);
        }
        Ok(items)
    }
}

const SELECT_BILL_ITEM: &str = r#"
    SELECT id, bill_id, service_type, description, quantity,
           unit_price_cents, amount_cents, medicine_id
    FROM bill_items
"#;

/// Intermediate row struct for database mapping.
struct BillRow {
    id: i64,
    appointment_id: Option<i64>,
    admission_id: Option<i64>,
    bill_date: String,
    total_cents: i64,
    paid_cents: i64,
    due_cents: i64,
    payment_status: String,
    payment_method: Option<String>,
    created_by: Option<i64>,
}

fn bill_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillRow> {
    Ok(BillRow {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        admission_id: row.get(2)?,
        bill_date: row.get(3)?,
        total_cents: row.get(4)?,
        paid_cents: row.get(5)?,
        due_cents: row.get(6)?,
        payment_status: row.get(7)?,
        payment_method: row.get(8)?,
        created_by: row.get(9)?,
    })
}

impl TryFrom<BillRow> for Bill {
    type Error = DbError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        let payment_status =
            PaymentStatus::parse(&row.payment_status).map_err(DbError::Constraint)?;
        let payment_method = row
            .payment_method
            .as_deref()
            .map(PaymentMethod::parse)
            .transpose()
            .map_err(DbError::Constraint)?;
        Ok(Bill {
            id: row.id,
            appointment_id: row.appointment_id,
            admission_id: row.admission_id,
            bill_date: row.bill_date,
            total_cents: row.total_cents,
            paid_cents: row.paid_cents,
            due_cents: row.due_cents,
            payment_status,
            payment_method,
            created_by: row.created_by,
        })
    }
}

/// Intermediate row struct for database mapping.
struct BillItemRow {
    id: i64,
    bill_id: i64,
    service_type: String,
    description: String,
    quantity: i64,
    unit_price_cents: i64,
    amount_cents: i64,
    medicine_id: Option<i64>,
}

fn bill_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillItemRow> {
    Ok(BillItemRow {
        id: row.get(0)?,
        bill_id: row.get(1)?,
        service_type: row.get(2)?,
        description: row.get(3)?,
        quantity: row.get(4)?,
        unit_price_cents: row.get(5)?,
        amount_cents: row.get(6)?,
        medicine_id: row.get(7)?,
    })
}

impl TryFrom<BillItemRow> for BillItem {
    type Error = DbError;

    fn try_from(row: BillItemRow) -> Result<Self, Self::Error> {
        let service_type = ServiceType::parse(&row.service_type).map_err(DbError::Constraint)?;
        Ok(BillItem {
            id: row.id,
            bill_id: row.bill_id,
            service_type,
            description: row.description,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            amount_cents: row.amount_cents,
            medicine_id: row.medicine_id,
        })
    }
}
