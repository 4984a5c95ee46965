//! Order domain models.
//!
//! Order items carry the product name and unit price frozen at checkout
//! time, so historical orders stay accurate when the catalog changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bluebell_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};

/// A shipping address; every field is required at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// The name of the first empty field, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        if self.address.trim().is_empty() {
            Some("address")
        } else if self.city.trim().is_empty() {
            Some("city")
        } else if self.postal_code.trim().is_empty() {
            Some("postalCode")
        } else if self.country.trim().is_empty() {
            Some("country")
        } else {
            None
        }
    }
}

/// One order line with snapshot pricing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product: ProductId,
    pub product_name: String,
    pub unit_price: Price,
    pub quantity: i32,
}

/// A committed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    /// Present only on admin-wide listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The immutable snapshot of a cancelled order.
///
/// Shares the original order's id; status is always `Canceled`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanceledOrder {
    pub id: OrderId,
    pub user: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub phone_number: String,
    pub payment_method: PaymentMethod,
    pub ordered_at: DateTime<Utc>,
    pub canceled_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete_address() -> ShippingAddress {
        ShippingAddress {
            address: "12 High Street".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "USA".to_string(),
        }
    }

    #[test]
    fn test_complete_address_has_no_missing_field() {
        assert_eq!(complete_address().first_missing_field(), None);
    }

    #[test]
    fn test_each_empty_field_is_reported() {
        let mut addr = complete_address();
        addr.address = String::new();
        assert_eq!(addr.first_missing_field(), Some("address"));

        let mut addr = complete_address();
        addr.city = "  ".to_string();
        assert_eq!(addr.first_missing_field(), Some("city"));

        let mut addr = complete_address();
        addr.postal_code = String::new();
        assert_eq!(addr.first_missing_field(), Some("postalCode"));

        let mut addr = complete_address();
        addr.country = String::new();
        assert_eq!(addr.first_missing_field(), Some("country"));
    }

    #[test]
    fn test_order_json_shape() {
        let order = Order {
            id: OrderId::new(5),
            user: UserId::new(7),
            customer_name: None,
            items: vec![OrderItem {
                product: ProductId::new(1),
                product_name: "Ibuprofen 200mg".to_string(),
                unit_price: Price::from_cents(1000),
                quantity: 2,
            }],
            total_amount: Price::from_cents(2000),
            status: OrderStatus::OnDelivery,
            shipping_address: complete_address(),
            phone_number: "5551234567".to_string(),
            payment_method: PaymentMethod::Card,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["status"], "On-Delivery");
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["shippingAddress"]["postalCode"], "12345");
        assert_eq!(json["items"][0]["productName"], "Ibuprofen 200mg");
        // customer_name is omitted outside admin listings
        assert!(json.get("customerName").is_none());
    }
}
