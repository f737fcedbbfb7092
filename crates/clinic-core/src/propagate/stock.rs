//! Low-stock alert propagator.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{DbError, DbResult};
use crate::models::LowStockAlert;

/// After a write to a medicine's stock fields, append a low-stock snapshot
/// when `current_stock <= minimum_stock`.
///
/// Fires on every qualifying write, including repeats that leave stock still
/// below the threshold; the alert table is an append-only history, and
/// callers wanting "active alerts" read the latest snapshot per medicine.
/// Returns the appended alert, or `None` when stock is above the threshold.
pub fn check_low_stock(
    conn: &Connection,
    now: DateTime<Utc>,
    medicine_id: i64,
) -> DbResult<Option<LowStockAlert>> {
    let row: Option<(String, String, i64, i64)> = conn
        .query_row(
            "SELECT code, name, current_stock, minimum_stock FROM medicines WHERE id = ?",
            [medicine_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    let (code, name, current_stock, minimum_stock) =
        row.ok_or_else(|| DbError::NotFound(format!("medicine {}", medicine_id)))?;

    if current_stock > minimum_stock {
        return Ok(None);
    }

    let created_at = now.to_rfc3339();
    conn.execute(
        r#"
        INSERT INTO low_stock_alerts (
            medicine_id, medicine_code, medicine_name,
            current_stock, minimum_stock, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![medicine_id, code, name, current_stock, minimum_stock, created_at],
    )?;
    let id = conn.last_insert_rowid();

    Ok(Some(LowStockAlert {
        id,
        medicine_id,
        medicine_code: code,
        medicine_name: name,
        current_stock,
        minimum_stock,
        created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup_db(current: i64, minimum: i64) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO medicines (code, name, unit_price_cents, current_stock, minimum_stock, maximum_stock)
                 VALUES ('AMX-500', 'Amoxicillin 500mg', 120, ?1, ?2, 500)",
                params![current, minimum],
            )
            .unwrap();
        db
    }

    fn now() -> DateTime<Utc> {
        "2024-03-10T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_no_alert_above_threshold() {
        let db = setup_db(50, 10);
        let alert = check_low_stock(db.conn(), now(), 1).unwrap();
        assert!(alert.is_none());
    }

    #[test]
    fn test_alert_at_threshold() {
        let db = setup_db(10, 10);
        let alert = check_low_stock(db.conn(), now(), 1).unwrap().unwrap();
        assert_eq!(alert.current_stock, 10);
        assert_eq!(alert.minimum_stock, 10);
        assert_eq!(alert.medicine_code, "AMX-500");
    }

    #[test]
    fn test_repeated_checks_append_history() {
        let db = setup_db(5, 10);
        check_low_stock(db.conn(), now(), 1).unwrap().unwrap();
        check_low_stock(db.conn(), now(), 1).unwrap().unwrap();

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM low_stock_alerts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_missing_medicine_is_not_found() {
        let db = setup_db(5, 10);
        let err = check_low_stock(db.conn(), now(), 42).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
