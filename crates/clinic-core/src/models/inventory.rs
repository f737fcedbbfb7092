//! Medicine and inventory models.

use serde::{Deserialize, Serialize};

/// Inventory movement type. The quantity sign rule depends on it: purchases
/// and returns must be positive, the rest merely non-zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionType {
    Purchase,
    Sale,
    Return,
    Wastage,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "Purchase",
            TransactionType::Sale => "Sale",
            TransactionType::Return => "Return",
            TransactionType::Wastage => "Wastage",
            TransactionType::Adjustment => "Adjustment",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Purchase" => Ok(TransactionType::Purchase),
            "Sale" => Ok(TransactionType::Sale),
            "Return" => Ok(TransactionType::Return),
            "Wastage" => Ok(TransactionType::Wastage),
            "Adjustment" => Ok(TransactionType::Adjustment),
            _ => Err(format!("unknown transaction type '{}'", s)),
        }
    }
}

/// Input for adding a medicine to the formulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewMedicine {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
}

/// A stored medicine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub unit_price_cents: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub maximum_stock: i64,
    pub is_active: bool,
}

impl Medicine {
    /// Whether the current stock sits at or below the reorder threshold.
    pub fn is_low(&self) -> bool {
        self.current_stock <= self.minimum_stock
    }
}

/// Input for recording an inventory movement. Total cost is derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInventoryTransaction {
    pub medicine_id: i64,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub reference: Option<String>,
    pub performed_by: Option<i64>,
}

/// A stored inventory movement with its derived total cost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    pub id: i64,
    pub medicine_id: i64,
    pub transaction_type: TransactionType,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub total_cost_cents: i64,
    pub reference: Option<String>,
    pub performed_by: Option<i64>,
    pub created_at: String,
}

/// Append-only low-stock snapshot. One row per qualifying stock write; the
/// table is a history, not a deduplicated set of active alerts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockAlert {
    pub id: i64,
    pub medicine_id: i64,
    pub medicine_code: String,
    pub medicine_name: String,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub created_at: String,
}

/// Result of a stock adjustment: the new level plus the alert it raised, if
/// the write left stock at or below the threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StockLevel {
    pub medicine_id: i64,
    pub current_stock: i64,
    pub minimum_stock: i64,
    pub alert: Option<LowStockAlert>,
}
