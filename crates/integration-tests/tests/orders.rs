//! End-to-end order lifecycle tests: status updates and cancellation.
//!
//! Requirements are the same as `checkout.rs`: running server, migrated and
//! seeded database, admin credentials in the environment.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use bluebell_integration_tests::{
    Account, admin_account, base_url, client, get_json, register_customer,
};

/// Test helper: place an order for one fresh product, returning the order.
async fn place_order(client: &Client, admin: &Account, customer: &Account) -> Value {
    let manufacturer_name = format!("it-mfr-{}", Uuid::new_v4());
    let resp = client
        .post(format!("{}/api/manufacturers", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({ "name": manufacturer_name }))
        .send()
        .await
        .expect("create manufacturer");
    let manufacturer: Value = resp.json().await.expect("manufacturer body");

    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({
            "name": format!("it-product-{}", Uuid::new_v4()),
            "manufacturer": manufacturer["id"],
            "price": "9.99",
            "stock_level": 10,
        }))
        .send()
        .await
        .expect("create product");
    let product: Value = resp.json().await.expect("product body");

    let resp = client
        .post(format!("{}/api/cart", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({ "productId": product["id"], "quantity": 1 }))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), 200);

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
            "phoneNumber": "5551234567",
            "paymentMethod": "cash",
        }))
        .send()
        .await
        .expect("checkout");
    assert_eq!(resp.status(), 201);
    resp.json().await.expect("order body")
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_cancel_moves_order_into_canceled_collection() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;
    let order = place_order(&client, &admin, &customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = client
        .delete(format!("{}/api/orders/{order_id}", base_url()))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("cancel");
    assert_eq!(resp.status(), 200);
    let canceled: Value = resp.json().await.expect("canceled body");
    assert_eq!(canceled["status"], "Canceled");

    // Absent from the live orders...
    let (_, orders) = get_json(&client, &customer.token, "/api/orders").await;
    assert!(
        orders
            .as_array()
            .expect("orders array")
            .iter()
            .all(|o| o["id"] != order_id),
        "cancelled order still listed live"
    );

    // ...present exactly once in the canceled view, with identical data.
    let (_, canceled_orders) = get_json(&client, &customer.token, "/api/orders/canceled").await;
    let snapshots: Vec<&Value> = canceled_orders
        .as_array()
        .expect("canceled array")
        .iter()
        .filter(|o| o["id"] == order_id)
        .collect();
    assert_eq!(snapshots.len(), 1);

    let snapshot = snapshots[0];
    assert_eq!(snapshot["totalAmount"], order["totalAmount"]);
    assert_eq!(snapshot["shippingAddress"], order["shippingAddress"]);
    assert_eq!(snapshot["paymentMethod"], order["paymentMethod"]);
    assert_eq!(snapshot["items"], order["items"]);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_cancel_delivered_order_conflicts_and_changes_nothing() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;
    let order = place_order(&client, &admin, &customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    // Admin marks it delivered
    let resp = client
        .put(format!("{}/api/orders/{order_id}/status", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({ "status": "Delivered" }))
        .send()
        .await
        .expect("status update");
    assert_eq!(resp.status(), 200);

    // Cancellation now conflicts
    let resp = client
        .delete(format!("{}/api/orders/{order_id}", base_url()))
        .bearer_auth(&customer.token)
        .send()
        .await
        .expect("cancel");
    assert_eq!(resp.status(), 409);

    // The order is still live and delivered; nothing moved.
    let (_, orders) = get_json(&client, &customer.token, "/api/orders").await;
    let live: Vec<&Value> = orders
        .as_array()
        .expect("orders array")
        .iter()
        .filter(|o| o["id"] == order_id)
        .collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0]["status"], "Delivered");

    let (_, canceled) = get_json(&client, &customer.token, "/api/orders/canceled").await;
    assert!(
        canceled
            .as_array()
            .expect("canceled array")
            .iter()
            .all(|o| o["id"] != order_id)
    );
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_cancel_foreign_order_forbidden() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let owner = register_customer(&client).await;
    let other = register_customer(&client).await;
    let order = place_order(&client, &admin, &owner).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = client
        .delete(format!("{}/api/orders/{order_id}", base_url()))
        .bearer_auth(&other.token)
        .send()
        .await
        .expect("cancel");
    assert_eq!(resp.status(), 403);

    // Still present for the owner
    let (_, orders) = get_json(&client, &owner.token, "/api/orders").await;
    assert!(
        orders
            .as_array()
            .expect("orders array")
            .iter()
            .any(|o| o["id"] == order_id)
    );
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_status_update_requires_admin() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;
    let order = place_order(&client, &admin, &customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    let resp = client
        .put(format!("{}/api/orders/{order_id}/status", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({ "status": "Delivered" }))
        .send()
        .await
        .expect("status update");
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_admin_listing_includes_customer_name() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;
    let order = place_order(&client, &admin, &customer).await;
    let order_id = order["id"].as_i64().expect("order id");

    let (status, all_orders) = get_json(&client, &admin.token, "/api/orders/all").await;
    assert_eq!(status, 200);

    let found = all_orders
        .as_array()
        .expect("orders array")
        .iter()
        .find(|o| o["id"] == order_id)
        .expect("order in admin listing")
        .clone();
    assert_eq!(found["customerName"], "Integration Test");
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_unauthenticated_requests_rejected() {
    let client = client();

    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/orders", base_url()))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 401);
}
