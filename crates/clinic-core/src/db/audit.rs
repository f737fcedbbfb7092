//! Activity log database operations.
//!
//! The log is append-only and hash-chained: every entry's hash covers the
//! previous entry's hash plus its own content, so any rewrite of stored
//! history breaks verification at the altered link. No update or delete
//! operation exists for this table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

use super::{Database, DbResult};
use crate::models::ActivityEntry;

impl Database {
    /// Append an activity entry outside any larger transaction.
    pub fn append_activity(
        &self,
        actor_id: Option<i64>,
        action: &str,
        detail: serde_json::Value,
    ) -> DbResult<ActivityEntry> {
        append_entry(&self.conn, self.now(), actor_id, action, detail)
    }

    /// List the most recent activity entries, newest first.
    pub fn list_activity(&self, limit: usize) -> DbResult<Vec<ActivityEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, actor_id, action, detail, prev_hash, entry_hash, created_at
            FROM activity_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], entry_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Walk the whole chain oldest-first and recompute every hash. Returns
    /// the id of the first entry whose stored hash does not match, or `None`
    /// when the chain is intact.
    pub fn verify_activity_chain(&self) -> DbResult<Option<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, actor_id, action, detail, prev_hash, entry_hash, created_at
            FROM activity_log
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map([], entry_row)?;

        let mut expected_prev: Option<String> = None;
        for row in rows {
            let entry = row?;
            let recomputed = entry_hash(
                expected_prev.as_deref(),
                entry.actor_id,
                &entry.action,
                &entry.detail,
                &entry.created_at,
            );
            if entry.prev_hash != expected_prev || entry.entry_hash != recomputed {
                return Ok(Some(entry.id));
            }
            expected_prev = Some(entry.entry_hash);
        }
        Ok(None)
    }
}

/// Append an entry on a live connection, joining the caller's transaction.
pub fn append_entry(
    conn: &Connection,
    now: DateTime<Utc>,
    actor_id: Option<i64>,
    action: &str,
    detail: serde_json::Value,
) -> DbResult<ActivityEntry> {
    let prev_hash: Option<String> = conn
        .query_row(
            "SELECT entry_hash FROM activity_log ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let detail_str = detail.to_string();
    let created_at = now.to_rfc3339();
    let hash = entry_hash(prev_hash.as_deref(), actor_id, action, &detail_str, &created_at);

    conn.execute(
        r#"
        INSERT INTO activity_log (actor_id, action, detail, prev_hash, entry_hash, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![actor_id, action, detail_str, prev_hash, hash, created_at],
    )?;
    let id = conn.last_insert_rowid();

    Ok(ActivityEntry {
        id,
        actor_id,
        action: action.to_string(),
        detail: detail_str,
        prev_hash,
        entry_hash: hash,
        created_at,
    })
}

/// SHA-256 over the chain predecessor and this entry's content.
fn entry_hash(
    prev_hash: Option<&str>,
    actor_id: Option<i64>,
    action: &str,
    detail: &str,
    created_at: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.unwrap_or(""));
    hasher.update(b"|");
    hasher.update(actor_id.map(|id| id.to_string()).unwrap_or_default());
    hasher.update(b"|");
    hasher.update(action);
    hasher.update(b"|");
    hasher.update(detail);
    hasher.update(b"|");
    hasher.update(created_at);
    hex::encode(hasher.finalize())
}

fn entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityEntry> {
    Ok(ActivityEntry {
        id: row.get(0)?,
        actor_id: row.get(1)?,
        action: row.get(2)?,
        detail: row.get(3)?,
        prev_hash: row.get(4)?,
        entry_hash: row.get(5)?,
        created_at: row.get(6)?,
    })
}
