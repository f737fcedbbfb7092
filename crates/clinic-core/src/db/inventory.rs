//! Medicine and inventory database operations.

use rusqlite::{params, OptionalExtension};
use serde_json::json;
use strsim::jaro_winkler;

use super::{audit, map_write_err, Database, DbError, DbResult};
use crate::derivation;
use crate::models::{
    InventoryTransaction, LowStockAlert, Medicine, NewInventoryTransaction, NewMedicine,
    StockLevel, TransactionType,
};
use crate::propagate;
use crate::rules;

impl Database {
    /// Add a medicine to the formulary. Stock bounds are validated up front;
    /// an initial stock already at or below the minimum raises an alert
    /// immediately, in the same transaction as the insert.
    pub fn add_medicine(&mut self, new: &NewMedicine) -> DbResult<Medicine> {
        rules::check_stock_levels(new.current_stock, new.minimum_stock, new.maximum_stock)?;
        rules::check_non_negative("medicine.unit_price", new.unit_price_cents)?;
        let now = self.now();

        let tx = self.transaction()?;
        tx.execute(
            r#"
            INSERT INTO medicines (
                code, name, category, unit_price_cents,
                current_stock, minimum_stock, maximum_stock
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                new.code,
                new.name,
                new.category,
                new.unit_price_cents,
                new.current_stock,
                new.minimum_stock,
                new.maximum_stock,
            ],
        )
        .map_err(|e| map_write_err(e, "medicine"))?;
        let id = tx.last_insert_rowid();

        propagate::check_low_stock(&tx, now, id)?;
        tx.commit()?;

        self.get_medicine(id)?
            .ok_or_else(|| DbError::NotFound(format!("medicine {}", id)))
    }

    /// Get a medicine by id.
    pub fn get_medicine(&self, id: i64) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                &format!("{} WHERE id = ?", SELECT_MEDICINE),
                [id],
                medicine_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a medicine by its unique code.
    pub fn get_medicine_by_code(&self, code: &str) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(
                &format!("{} WHERE code = ?", SELECT_MEDICINE),
                [code],
                medicine_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search medicines by name or code, ranked by similarity to the query.
    pub fn search_medicines(&self, query: &str, limit: usize) -> DbResult<Vec<Medicine>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE name LIKE ?1 OR code LIKE ?1",
            SELECT_MEDICINE
        ))?;

        let rows = stmt.query_map([&pattern], medicine_row)?;
        let mut medicines = rows.collect::<Result<Vec<_>, _>>()?;

        let needle = query.to_lowercase();
        medicines.sort_by(|a, b| {
            let score =
                |m: &Medicine| jaro_winkler(&needle, &m.name.to_lowercase());
            score(b)
                .partial_cmp(&score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        medicines.truncate(limit);
        Ok(medicines)
    }

    /// Apply a signed stock delta. The new level is validated (stock may not
    /// go negative), the alert propagator runs, and an audit entry is
    /// appended, all in one transaction.
    pub fn adjust_stock(
        &mut self,
        medicine_id: i64,
        delta: i64,
        recorded_by: Option<i64>,
    ) -> DbResult<StockLevel> {
        let now = self.now();

        let tx = self.transaction()?;
        let row: Option<(i64, i64)> = tx
            .query_row(
                "SELECT current_stock, minimum_stock FROM medicines WHERE id = ?",
                [medicine_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (current, minimum) =
            row.ok_or_else(|| DbError::NotFound(format!("medicine {}", medicine_id)))?;

        let new_stock = current + delta;
        rules::check_non_negative("medicine.current_stock", new_stock)?;

        tx.execute(
            "UPDATE medicines SET current_stock = ?2 WHERE id = ?1",
            params![medicine_id, new_stock],
        )?;

        let alert = propagate::check_low_stock(&tx, now, medicine_id)?;
        audit::append_entry(
            &tx,
            now,
            recorded_by,
            "stock.adjusted",
            json!({
                "medicine_id": medicine_id,
                "delta": delta,
                "current_stock": new_stock,
                "alert_raised": alert.is_some(),
            }),
        )?;
        tx.commit()?;

        Ok(StockLevel {
            medicine_id,
            current_stock: new_stock,
            minimum_stock: minimum,
            alert,
        })
    }

    /// Record an inventory movement. Bookkeeping only: the quantity sign rule
    /// is enforced and the total cost derived, but stock moves exclusively
    /// through [`Database::adjust_stock`].
    pub fn record_inventory_transaction(
        &self,
        new: &NewInventoryTransaction,
    ) -> DbResult<InventoryTransaction> {
        rules::check_quantity_sign(new.transaction_type, new.quantity)?;
        rules::check_non_negative("inventory.unit_cost", new.unit_cost_cents)?;
        let total_cost = derivation::transaction_cost_cents(new.quantity, new.unit_cost_cents);
        let created_at = self.now().to_rfc3339();

        self.conn
            .execute(
                r#"
                INSERT INTO inventory_transactions (
                    medicine_id, transaction_type, quantity, unit_cost_cents,
                    total_cost_cents, reference, performed_by, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    new.medicine_id,
                    new.transaction_type.as_str(),
                    new.quantity,
                    new.unit_cost_cents,
                    total_cost,
                    new.reference,
                    new.performed_by,
                    created_at,
                ],
            )
            .map_err(|e| map_write_err(e, "inventory transaction"))?;

        let id = self.conn.last_insert_rowid();
        self.get_inventory_transaction(id)?
            .ok_or_else(|| DbError::NotFound(format!("inventory transaction {}", id)))
    }

    /// Get an inventory movement by id.
    pub fn get_inventory_transaction(&self, id: i64) -> DbResult<Option<InventoryTransaction>> {
        self.conn
            .query_row(
                r#"
                SELECT id, medicine_id, transaction_type, quantity, unit_cost_cents,
                       total_cost_cents, reference, performed_by, created_at
                FROM inventory_transactions
                WHERE id = ?
                "#,
                [id],
                transaction_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List low-stock alerts, newest first, optionally scoped to a medicine.
    pub fn list_low_stock_alerts(&self, medicine_id: Option<i64>) -> DbResult<Vec<LowStockAlert>> {
        let mut alerts = Vec::new();
        match medicine_id {
            Some(id) => {
                let mut stmt = self.conn.prepare(&format!(
                    "{} WHERE medicine_id = ? ORDER BY id DESC",
                    SELECT_ALERT
                ))?;
                let rows = stmt.query_map([id], alert_row)?;
                for row in rows {
                    alerts.push(row?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!("{} ORDER BY id DESC", SELECT_ALERT))?;
                let rows = stmt.query_map([], alert_row)?;
                for row in rows {
                    alerts.push(row?);
                }
            }
        }
        Ok(alerts)
    }

    /// The latest alert snapshot for a medicine, if any was ever raised.
    pub fn latest_low_stock_alert(&self, medicine_id: i64) -> DbResult<Option<LowStockAlert>> {
        self.conn
            .query_row(
                &format!(
                    "{} WHERE medicine_id = ? ORDER BY id DESC LIMIT 1",
                    SELECT_ALERT
                ),
                [medicine_id],
                alert_row,
            )
            .optional()
            .map_err(Into::into)
    }
}

const SELECT_MEDICINE: &str = r#"
    SELECT id, code, name, category, unit_price_cents,
           current_stock, minimum_stock, maximum_stock, is_active
    FROM medicines
"#;

const SELECT_ALERT: &str = r#"
    SELECT id, medicine_id, medicine_code, medicine_name,
           current_stock, minimum_stock, created_at
    FROM low_stock_alerts
"#;

fn medicine_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        unit_price_cents: row.get(4)?,
        current_stock: row.get(5)?,
        minimum_stock: row.get(6)?,
        maximum_stock: row.get(7)?,
        is_active: row.get(8)?,
    })
}

fn alert_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LowStockAlert> {
    Ok(LowStockAlert {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        medicine_code: row.get(2)?,
        medicine_name: row.get(3)?,
        current_stock: row.get(4)?,
        minimum_stock: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Intermediate row struct for database mapping.
struct TransactionRow {
    id: i64,
    medicine_id: i64,
    transaction_type: String,
    quantity: i64,
    unit_cost_cents: i64,
    total_cost_cents: i64,
    reference: Option<String>,
    performed_by: Option<i64>,
    created_at: String,
}

fn transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        transaction_type: row.get(2)?,
        quantity: row.get(3)?,
        unit_cost_cents: row.get(4)?,
        total_cost_cents: row.get(5)?,
        reference: row.get(6)?,
        performed_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl TryFrom<TransactionRow> for InventoryTransaction {
    type Error = DbError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let transaction_type =
            TransactionType::parse(&row.transaction_type).map_err(DbError::Constraint)?;
        Ok(InventoryTransaction {
            id: row.id,
            medicine_id: row.medicine_id,
            transaction_type,
            quantity: row.quantity,
            unit_cost_cents: row.unit_cost_cents,
            total_cost_cents: row.total_cost_cents,
            reference: row.reference,
            performed_by: row.performed_by,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_medicine(code: &str, current: i64, minimum: i64) -> NewMedicine {
        NewMedicine {
            code: code.into(),
            name: "Amoxicillin 500mg".into(),
            category: Some("Antibiotics".into()),
            unit_price_cents: 120,
            current_stock: current,
            minimum_stock: minimum,
            maximum_stock: 500,
        }
    }

    #[test]
    fn test_add_and_get_medicine() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();
        assert_eq!(med.code, "AMX-500");
        assert!(!med.is_low());

        let by_code = db.get_medicine_by_code("AMX-500").unwrap().unwrap();
        assert_eq!(by_code.id, med.id);
    }

    #[test]
    fn test_duplicate_code_is_conflict() {
        let mut db = setup_db();
        db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();
        let err = db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[test]
    fn test_bad_stock_bounds_rejected() {
        let mut db = setup_db();
        let mut new = make_medicine("AMX-500", 50, 10);
        new.minimum_stock = 500;
        let err = db.add_medicine(&new).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_add_with_low_initial_stock_alerts_immediately() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 5, 10)).unwrap();
        let alerts = db.list_low_stock_alerts(Some(med.id)).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].current_stock, 5);
    }

    #[test]
    fn test_adjust_stock_below_threshold_alerts() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();

        let level = db.adjust_stock(med.id, -45, None).unwrap();
        assert_eq!(level.current_stock, 5);
        assert!(level.alert.is_some());

        // Repeat while still low: second snapshot, no dedup
        let level = db.adjust_stock(med.id, 0, None).unwrap();
        assert!(level.alert.is_some());
        let alerts = db.list_low_stock_alerts(Some(med.id)).unwrap();
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn test_adjust_stock_cannot_go_negative() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 10, 5)).unwrap();
        let err = db.adjust_stock(med.id, -11, None).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Stock untouched by the rejected write
        let stored = db.get_medicine(med.id).unwrap().unwrap();
        assert_eq!(stored.current_stock, 10);
    }

    #[test]
    fn test_inventory_transaction_derives_cost() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();

        let tx = db
            .record_inventory_transaction(&NewInventoryTransaction {
                medicine_id: med.id,
                transaction_type: TransactionType::Sale,
                quantity: -4,
                unit_cost_cents: 120,
                reference: Some("INV-77".into()),
                performed_by: None,
            })
            .unwrap();
        assert_eq!(tx.total_cost_cents, 480);
    }

    #[test]
    fn test_inventory_transaction_sign_rule() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();

        let err = db
            .record_inventory_transaction(&NewInventoryTransaction {
                medicine_id: med.id,
                transaction_type: TransactionType::Purchase,
                quantity: -4,
                unit_cost_cents: 120,
                reference: None,
                performed_by: None,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_latest_alert_per_medicine() {
        let mut db = setup_db();
        let med = db.add_medicine(&make_medicine("AMX-500", 12, 10)).unwrap();
        assert!(db.latest_low_stock_alert(med.id).unwrap().is_none());

        db.adjust_stock(med.id, -4, None).unwrap();
        db.adjust_stock(med.id, -3, None).unwrap();

        let latest = db.latest_low_stock_alert(med.id).unwrap().unwrap();
        assert_eq!(latest.current_stock, 5);
    }

    #[test]
    fn test_search_medicines_ranked() {
        let mut db = setup_db();
        db.add_medicine(&make_medicine("AMX-500", 50, 10)).unwrap();
        let mut other = make_medicine("PCM-500", 50, 10);
        other.name = "Paracetamol 500mg".into();
        db.add_medicine(&other).unwrap();

        let results = db.search_medicines("Amoxicillin", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "AMX-500");
    }
}
