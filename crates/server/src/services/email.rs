//! Email service for order receipts.
//!
//! Uses SMTP via lettre. Receipts are best-effort: the checkout that
//! triggers one has already committed, so a delivery failure is logged and
//! goes no further.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;
use crate::models::order::Order;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send an order receipt.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or delivered.
    pub async fn send_order_receipt(&self, to: &str, order: &Order) -> Result<(), EmailError> {
        let subject = format!("Bluebell Pharmacy - receipt for order #{}", order.id);
        let body = render_receipt(order);

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, order_id = %order.id, "Receipt email sent");
        Ok(())
    }
}

/// Render a plain-text receipt body.
fn render_receipt(order: &Order) -> String {
    let mut body = String::new();
    body.push_str(&format!("Thank you for your order #{}.\n\n", order.id));

    for item in &order.items {
        body.push_str(&format!(
            "  {} x {} @ {}\n",
            item.quantity,
            item.product_name,
            item.unit_price.display()
        ));
    }

    body.push_str(&format!("\nTotal: {}\n", order.total_amount.display()));
    body.push_str(&format!(
        "\nShipping to: {}, {}, {}, {}\n",
        order.shipping_address.address,
        order.shipping_address.city,
        order.shipping_address.postal_code,
        order.shipping_address.country
    ));
    body.push_str(&format!("Payment method: {}\n", order.payment_method));
    body
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::order::{OrderItem, ShippingAddress};
    use bluebell_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};
    use chrono::Utc;

    #[test]
    fn test_render_receipt_lists_items_and_total() {
        let order = Order {
            id: OrderId::new(12),
            user: UserId::new(3),
            customer_name: None,
            items: vec![
                OrderItem {
                    product: ProductId::new(1),
                    product_name: "Paracetamol 500mg".to_string(),
                    unit_price: Price::from_cents(1000),
                    quantity: 2,
                },
                OrderItem {
                    product: ProductId::new(2),
                    product_name: "Vitamin C".to_string(),
                    unit_price: Price::from_cents(500),
                    quantity: 1,
                },
            ],
            total_amount: Price::from_cents(2500),
            status: OrderStatus::OnDelivery,
            shipping_address: ShippingAddress {
                address: "12 High Street".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "USA".to_string(),
            },
            phone_number: "5551234567".to_string(),
            payment_method: PaymentMethod::Card,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = render_receipt(&order);
        assert!(body.contains("order #12"));
        assert!(body.contains("2 x Paracetamol 500mg @ $10.00"));
        assert!(body.contains("Total: $25.00"));
        assert!(body.contains("Payment method: card"));
    }
}
