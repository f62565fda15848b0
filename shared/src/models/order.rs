//! Order Model

use crate::types::WaecType;
use serde::{Deserialize, Serialize};

/// Order status, driven entirely by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Completed,
    Cancelled,
}

/// Payment status as reported by the payment gateway webhook.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

/// A customer purchase of one or more checkers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub phone: String,
    pub email: String,
    pub waec_type: WaecType,
    pub quantity: u32,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Order {
    /// Single authoritative "paid" predicate.
    ///
    /// The backend has historically signalled payment three different
    /// ways; `payment_status` is authoritative, with terminal statuses
    /// accepted for rows written before that column existed.
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
            || matches!(self.status, OrderStatus::Paid | OrderStatus::Completed)
    }

    /// Revenue contributed by this order, if paid.
    pub fn paid_amount(&self) -> f64 {
        if self.is_paid() {
            self.amount.unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus, payment: PaymentStatus) -> Order {
        Order {
            id: "o1".into(),
            phone: "233543482189".into(),
            email: "a@b.com".into(),
            waec_type: WaecType::Bece,
            quantity: 1,
            status,
            payment_status: payment,
            payment_reference: None,
            amount: Some(17.5),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_is_paid() {
        assert!(order(OrderStatus::Pending, PaymentStatus::Paid).is_paid());
        assert!(order(OrderStatus::Completed, PaymentStatus::Unpaid).is_paid());
        assert!(order(OrderStatus::Paid, PaymentStatus::Unpaid).is_paid());
        assert!(!order(OrderStatus::Pending, PaymentStatus::Unpaid).is_paid());
        assert!(!order(OrderStatus::Cancelled, PaymentStatus::Unpaid).is_paid());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
