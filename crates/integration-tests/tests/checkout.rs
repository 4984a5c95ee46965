//! End-to-end cart and checkout tests.
//!
//! These tests require:
//! - A running `PostgreSQL` database, migrated and seeded
//! - The server running (cargo run -p bluebell-server)
//! - Admin credentials in `BLUEBELL_TEST_ADMIN_EMAIL` /
//!   `BLUEBELL_TEST_ADMIN_PASSWORD` (tests return early without them)
//!
//! Run with: cargo test -p bluebell-integration-tests -- --ignored

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use bluebell_integration_tests::{
    Account, admin_account, base_url, client, get_json, register_customer,
};

/// Test helper: create a manufacturer and a product with the given price
/// (as a decimal string) and stock, returning the product id.
async fn create_product(client: &Client, admin: &Account, price: &str, stock: i32) -> i64 {
    let manufacturer_name = format!("it-mfr-{}", Uuid::new_v4());
    let resp = client
        .post(format!("{}/api/manufacturers", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({ "name": manufacturer_name }))
        .send()
        .await
        .expect("create manufacturer");
    assert_eq!(resp.status(), 201);
    let manufacturer: Value = resp.json().await.expect("manufacturer body");

    let product_name = format!("it-product-{}", Uuid::new_v4());
    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({
            "name": product_name,
            "manufacturer": manufacturer["id"],
            "price": price,
            "stock_level": stock,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), 201);
    let product: Value = resp.json().await.expect("product body");
    product["id"].as_i64().expect("product id")
}

/// Test helper: add a product to the caller's cart.
async fn add_to_cart(client: &Client, account: &Account, product_id: i64, quantity: i32) {
    let resp = client
        .post(format!("{}/api/cart", base_url()))
        .bearer_auth(&account.token)
        .json(&json!({ "productId": product_id, "quantity": quantity }))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), 200);
}

/// Test helper: checkout with a complete address.
async fn checkout(client: &Client, account: &Account) -> reqwest::Response {
    client
        .post(format!("{}/api/cart/checkout", base_url()))
        .bearer_auth(&account.token)
        .json(&json!({
            "shippingAddress": {
                "address": "12 High Street",
                "city": "Springfield",
                "postalCode": "12345",
                "country": "USA",
            },
            "phoneNumber": "5551234567",
            "paymentMethod": "card",
        }))
        .send()
        .await
        .expect("checkout request")
}

/// Test helper: current stock level of a product.
async fn stock_level(client: &Client, account: &Account, product_id: i64) -> i64 {
    let (status, body) = get_json(client, &account.token, &format!("/api/products/{product_id}")).await;
    assert_eq!(status, 200);
    body["stock_level"].as_i64().expect("stock_level")
}

// ============================================================================
// Checkout Properties
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_checkout_totals_clears_cart_and_decrements_stock() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    // Cart: 2 x $10 + 1 x $5
    let product_a = create_product(&client, &admin, "10.00", 50).await;
    let product_b = create_product(&client, &admin, "5.00", 50).await;
    add_to_cart(&client, &customer, product_a, 2).await;
    add_to_cart(&client, &customer, product_b, 1).await;

    let resp = checkout(&client, &customer).await;
    assert_eq!(resp.status(), 201);
    let order: Value = resp.json().await.expect("order body");

    assert_eq!(order["totalAmount"], "25.00");
    assert_eq!(order["status"], "On-Delivery");
    assert_eq!(order["paymentMethod"], "card");
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));

    // Cart is now empty
    let (status, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(status, 200);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));

    // Stock decremented by exactly the ordered quantities
    assert_eq!(stock_level(&client, &customer, product_a).await, 48);
    assert_eq!(stock_level(&client, &customer, product_b).await, 49);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_checkout_incomplete_address_creates_nothing() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let product = create_product(&client, &admin, "7.50", 10).await;
    add_to_cart(&client, &customer, product, 1).await;

    // City missing
    let resp = client
        .post(format!("{}/api/cart/checkout", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({
            "shippingAddress": {
                "address": "12 High Street",
                "city": "",
                "postalCode": "12345",
                "country": "USA",
            },
            "phoneNumber": "5551234567",
            "paymentMethod": "cash",
        }))
        .send()
        .await
        .expect("checkout request");
    assert_eq!(resp.status(), 400);

    // No order was created, stock untouched, cart untouched
    let (_, orders) = get_json(&client, &customer.token, "/api/orders").await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
    assert_eq!(stock_level(&client, &customer, product).await, 10);
    let (_, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_checkout_insufficient_stock_rolls_back() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    // Plenty of the first product, not enough of the second: the whole
    // checkout must fail without touching either stock level.
    let product_a = create_product(&client, &admin, "10.00", 50).await;
    let product_b = create_product(&client, &admin, "5.00", 1).await;
    add_to_cart(&client, &customer, product_a, 2).await;
    add_to_cart(&client, &customer, product_b, 3).await;

    let resp = checkout(&client, &customer).await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.expect("error body");
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|m| m.contains("stock")),
        "error should mention stock: {body}"
    );

    assert_eq!(stock_level(&client, &customer, product_a).await, 50);
    assert_eq!(stock_level(&client, &customer, product_b).await, 1);

    let (_, orders) = get_json(&client, &customer.token, "/api/orders").await;
    assert_eq!(orders.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_checkout_invalid_phone_rejected() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let product = create_product(&client, &admin, "3.00", 5).await;
    add_to_cart(&client, &customer, product, 1).await;

    let resp = client
        .post(format!("{}/api/cart/checkout", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({
            "shippingAddress": {
                "address": "12 High Street",
                "city": "Springfield",
                "postalCode": "12345",
                "country": "USA",
            },
            "phoneNumber": "555-123",
            "paymentMethod": "card",
        }))
        .send()
        .await
        .expect("checkout request");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_checkout_empty_cart_rejected() {
    let client = client();
    let customer = register_customer(&client).await;

    let resp = checkout(&client, &customer).await;
    assert_eq!(resp.status(), 400);
}

// ============================================================================
// Cart Mutations
// ============================================================================

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_update_quantity_zero_fails_and_line_survives() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let product = create_product(&client, &admin, "4.00", 10).await;
    add_to_cart(&client, &customer, product, 2).await;

    let resp = client
        .put(format!("{}/api/cart/{product}", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("update quantity");
    assert_eq!(resp.status(), 400);

    // The line is unchanged
    let (_, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_add_increments_and_decrement_removes() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let product = create_product(&client, &admin, "4.00", 10).await;
    add_to_cart(&client, &customer, product, 1).await;
    add_to_cart(&client, &customer, product, 2).await;

    let (_, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(cart["items"][0]["quantity"], 3);

    // One decrement: 3 -> 2
    let resp = client
        .delete(format!("{}/api/cart/{product}?decrement=true", base_url()))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("decrement");
    assert_eq!(resp.status(), 200);
    let (_, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(cart["items"][0]["quantity"], 2);

    // Full removal deletes the line
    let resp = client
        .delete(format!("{}/api/cart/{product}", base_url()))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("remove");
    assert_eq!(resp.status(), 200);
    let (_, cart) = get_json(&client, &customer.token, "/api/cart").await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
}
