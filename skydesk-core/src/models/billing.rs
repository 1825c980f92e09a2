use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::string_enum;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatus {
    Unpaid,
    Paid,
    Refunded,
    Void,
}

string_enum!(BillingStatus {
    Unpaid => "UNPAID",
    Paid => "PAID",
    Refunded => "REFUNDED",
    Void => "VOID",
});

impl BillingStatus {
    /// Status a billing moves to when its booking is cancelled.
    pub fn on_cancel(&self) -> BillingStatus {
        match self {
            BillingStatus::Paid => BillingStatus::Refunded,
            BillingStatus::Unpaid => BillingStatus::Void,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Cash,
    EWallet,
}

string_enum!(PaymentMethod {
    Card => "CARD",
    BankTransfer => "BANK_TRANSFER",
    Cash => "CASH",
    EWallet => "E_WALLET",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Billing {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub invoice_number: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: BillingStatus,
    pub payment_method: Option<PaymentMethod>,
    pub transaction_ref: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayBilling {
    pub payment_method: PaymentMethod,
    pub transaction_ref: Option<String>,
}

impl Billing {
    pub fn for_booking(booking_id: Uuid, booking_number: &str, amount_cents: i64, currency: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            invoice_number: crate::numbering::invoice_number(booking_number),
            amount_cents,
            currency: currency.to_string(),
            status: BillingStatus::Unpaid,
            payment_method: None,
            transaction_ref: None,
            paid_at: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
