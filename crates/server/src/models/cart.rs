//! Cart domain model.

use serde::Serialize;

use bluebell_core::{Price, ProductId};

/// One cart line, with product details resolved for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub images: Vec<String>,
    pub quantity: i32,
    pub line_total: Price,
}

/// A user's cart: resolved lines plus the running subtotal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub subtotal: Price,
}

impl Cart {
    /// Build a cart from resolved lines, summing the subtotal.
    #[must_use]
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(|line| line.line_total).sum();
        Self { items, subtotal }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product_id: i32, cents: i64, quantity: i32) -> CartLine {
        let price = Price::from_cents(cents);
        CartLine {
            product_id: ProductId::new(product_id),
            name: format!("product-{product_id}"),
            price,
            images: Vec::new(),
            quantity,
            line_total: price
                .line_total(u32::try_from(quantity).unwrap())
                .unwrap(),
        }
    }

    #[test]
    fn test_subtotal_sums_line_totals() {
        // 2 x $10 + 1 x $5 = $25
        let cart = Cart::from_lines(vec![line(1, 1000, 2), line(2, 500, 1)]);
        assert_eq!(cart.subtotal, Price::from_cents(2500));
    }

    #[test]
    fn test_empty_cart_has_zero_subtotal() {
        let cart = Cart::from_lines(Vec::new());
        assert_eq!(cart.subtotal, Price::ZERO);
        assert!(cart.items.is_empty());
    }
}
