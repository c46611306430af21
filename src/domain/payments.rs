use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum PaymentMethod {
        Cash => "cash",
        Card => "card",
        Wallet => "wallet",
        Transfer => "transfer",
    }
}

text_enum! {
    /// Outcome of an already-settled transaction
    pub enum PaymentRecordStatus {
        Paid => "paid",
        Failed => "failed",
        Pending => "pending",
        Refunded => "refunded",
    }
}

/// Payment record. Bookkeeping only; settlement happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub carwash_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentRecordStatus,
    pub transaction_ref: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for recording a payment
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub carwash_id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: Option<PaymentRecordStatus>,
    #[serde(default)]
    pub transaction_ref: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

/// Total of paid payments for one carwash
#[derive(Debug, Clone, Serialize)]
pub struct EarningsSummary {
    pub carwash_id: Uuid,
    pub total_paid: Decimal,
}
