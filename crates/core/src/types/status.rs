//! Status and payment-method enums for orders.

use serde::{Deserialize, Serialize};

/// Order delivery status.
///
/// Wire spellings (`On-Delivery`, `Delivered`, `Canceled`) are part of the
/// public API contract and of the database enum labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status"))]
pub enum OrderStatus {
    /// Placed and on its way; the only state a new order can be in.
    #[default]
    #[serde(rename = "On-Delivery")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "On-Delivery"))]
    OnDelivery,
    /// Terminal for cancellation purposes: a delivered order cannot be
    /// cancelled.
    #[serde(rename = "Delivered")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Delivered"))]
    Delivered,
    /// Only ever appears on snapshots in the canceled-orders collection;
    /// live orders never carry it.
    #[serde(rename = "Canceled")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Canceled"))]
    Canceled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnDelivery => write!(f, "On-Delivery"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Canceled => write!(f, "Canceled"),
        }
    }
}

/// How an order is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Cash,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Cash => write!(f, "cash"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::OnDelivery).unwrap(),
            "\"On-Delivery\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"Delivered\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Canceled).unwrap(),
            "\"Canceled\""
        );
    }

    #[test]
    fn test_order_status_parse() {
        let status: OrderStatus = serde_json::from_str("\"On-Delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OnDelivery);
        assert!(serde_json::from_str::<OrderStatus>("\"Shipped\"").is_err());
    }

    #[test]
    fn test_payment_method_wire_format() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Card).unwrap(),
            "\"card\""
        );
        let method: PaymentMethod = serde_json::from_str("\"cash\"").unwrap();
        assert_eq!(method, PaymentMethod::Cash);
        assert!(serde_json::from_str::<PaymentMethod>("\"bitcoin\"").is_err());
    }

    #[test]
    fn test_default_status_is_on_delivery() {
        assert_eq!(OrderStatus::default(), OrderStatus::OnDelivery);
    }
}
