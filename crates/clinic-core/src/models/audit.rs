//! Activity log models.

use serde::{Deserialize, Serialize};

/// One append-only audit entry. Entries form a SHA-256 hash chain: each
/// `entry_hash` covers the predecessor's hash and this entry's content, so
/// rewriting history breaks verification at the altered link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub id: i64,
    pub actor_id: Option<i64>,
    /// Dotted action name, e.g. `payment.recorded`, `stock.adjusted`.
    pub action: String,
    /// JSON detail payload.
    pub detail: String,
    pub prev_hash: Option<String>,
    pub entry_hash: String,
    pub created_at: String,
}
