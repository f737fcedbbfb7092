//! Billing models.

use serde::{Deserialize, Serialize};

/// Bill payment status, derived from the paid/total pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::PartiallyPaid => "PartiallyPaid",
            PaymentStatus::Paid => "Paid",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Unpaid" => Ok(PaymentStatus::Unpaid),
            "PartiallyPaid" => Ok(PaymentStatus::PartiallyPaid),
            "Paid" => Ok(PaymentStatus::Paid),
            _ => Err(format!("unknown payment status '{}'", s)),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::CreditCard => "CreditCard",
            PaymentMethod::BankTransfer => "BankTransfer",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "CreditCard" => Ok(PaymentMethod::CreditCard),
            "BankTransfer" => Ok(PaymentMethod::BankTransfer),
            _ => Err(format!("unknown payment method '{}'", s)),
        }
    }
}

/// Kind of service a bill line covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ServiceType {
    Consultation,
    Test,
    Medicine,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Consultation => "Consultation",
            ServiceType::Test => "Test",
            ServiceType::Medicine => "Medicine",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "Consultation" => Ok(ServiceType::Consultation),
            "Test" => Ok(ServiceType::Test),
            "Medicine" => Ok(ServiceType::Medicine),
            _ => Err(format!("unknown service type '{}'", s)),
        }
    }
}

/// Input for opening a bill. Exactly one of `appointment_id`/`admission_id`
/// must be set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBill {
    pub appointment_id: Option<i64>,
    pub admission_id: Option<i64>,
    pub total_cents: i64,
    /// Amount already settled at creation (imports); 0 for fresh bills.
    pub paid_cents: i64,
    pub created_by: Option<i64>,
}

/// A stored bill. Due amount and payment status are derived and owned by the
/// store; payments mutate them only through the payment transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bill {
    pub id: i64,
    pub appointment_id: Option<i64>,
    pub admission_id: Option<i64>,
    pub bill_date: String,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub due_cents: i64,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub created_by: Option<i64>,
}

/// Input for a bill line item. The extended amount is derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBillItem {
    pub bill_id: i64,
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub medicine_id: Option<i64>,
}

/// A stored bill line item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    pub service_type: ServiceType,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
    pub medicine_id: Option<i64>,
}
