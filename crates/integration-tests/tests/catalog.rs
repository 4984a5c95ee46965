//! End-to-end catalog tests: product CRUD, search, review aggregates.
//!
//! Requirements are the same as `checkout.rs`.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use bluebell_integration_tests::{
    Account, admin_account, base_url, client, get_json, register_customer,
};

/// Test helper: create a manufacturer, returning its id.
async fn create_manufacturer(client: &Client, admin: &Account) -> i64 {
    let resp = client
        .post(format!("{}/api/manufacturers", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({ "name": format!("it-mfr-{}", Uuid::new_v4()) }))
        .send()
        .await
        .expect("create manufacturer");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("manufacturer body");
    body["id"].as_i64().expect("manufacturer id")
}

/// Test helper: create a product under the manufacturer, returning its id.
async fn create_product(client: &Client, admin: &Account, manufacturer: i64, name: &str) -> i64 {
    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({
            "name": name,
            "manufacturer": manufacturer,
            "price": "6.25",
            "stock_level": 30,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.expect("product body");
    body["id"].as_i64().expect("product id")
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_review_aggregates_follow_reviews() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let manufacturer = create_manufacturer(&client, &admin).await;
    let product = create_product(
        &client,
        &admin,
        manufacturer,
        &format!("it-product-{}", Uuid::new_v4()),
    )
    .await;

    // Two reviews: 4 and 5 -> count 2, mean 4.5
    for (rating, comment) in [(4, "Solid"), (5, "Excellent")] {
        let resp = client
            .post(format!("{}/api/products/{product}/reviews", base_url()))
            .bearer_auth(&customer.token)
            .json(&json!({ "name": "Reviewer", "rating": rating, "comment": comment }))
            .send()
            .await
            .expect("add review");
        assert_eq!(resp.status(), 201);
    }

    let (_, detail) = get_json(&client, &customer.token, &format!("/api/products/{product}")).await;
    assert_eq!(detail["ratingsCount"], 2);
    assert!((detail["averageRating"].as_f64().expect("avg") - 4.5).abs() < f64::EPSILON);
    let reviews = detail["reviews"].as_array().expect("reviews").clone();
    assert_eq!(reviews.len(), 2);

    // Delete both; the last deletion resets the average without dividing
    // by zero.
    for review in &reviews {
        let review_id = review["id"].as_i64().expect("review id");
        let resp = client
            .delete(format!(
                "{}/api/products/{product}/reviews/{review_id}",
                base_url()
            ))
            .bearer_auth(&customer.token)
            .send()
            .await
            .expect("delete review");
        assert_eq!(resp.status(), 200);
    }

    let (_, detail) = get_json(&client, &customer.token, &format!("/api/products/{product}")).await;
    assert_eq!(detail["ratingsCount"], 0);
    assert!((detail["averageRating"].as_f64().expect("avg")).abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_review_rating_out_of_range_rejected() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let manufacturer = create_manufacturer(&client, &admin).await;
    let product = create_product(
        &client,
        &admin,
        manufacturer,
        &format!("it-product-{}", Uuid::new_v4()),
    )
    .await;

    for rating in [0, 6] {
        let resp = client
            .post(format!("{}/api/products/{product}/reviews", base_url()))
            .bearer_auth(&customer.token)
            .json(&json!({ "name": "Reviewer", "rating": rating, "comment": "x" }))
            .send()
            .await
            .expect("add review");
        assert_eq!(resp.status(), 400);
    }
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_duplicate_product_name_conflicts() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };

    let manufacturer = create_manufacturer(&client, &admin).await;
    let name = format!("it-product-{}", Uuid::new_v4());
    create_product(&client, &admin, manufacturer, &name).await;

    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&admin.token)
        .json(&json!({
            "name": name,
            "manufacturer": manufacturer,
            "price": "1.00",
            "stock_level": 1,
        }))
        .send()
        .await
        .expect("create duplicate");
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_manufacturer_with_products_cannot_be_deleted() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };

    let manufacturer = create_manufacturer(&client, &admin).await;
    create_product(
        &client,
        &admin,
        manufacturer,
        &format!("it-product-{}", Uuid::new_v4()),
    )
    .await;

    let resp = client
        .delete(format!("{}/api/manufacturers/{manufacturer}", base_url()))
        .bearer_auth(&admin.token)
        .send()
        .await
        .expect("delete manufacturer");
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_search_requires_query() {
    let client = client();
    let customer = register_customer(&client).await;

    let (status, _) = get_json(&client, &customer.token, "/api/products/search").await;
    assert_eq!(status, 400);

    let (status, _) = get_json(&client, &customer.token, "/api/products/search?q=").await;
    assert_eq!(status, 400);
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_search_matches_substring_case_insensitive() {
    let client = client();
    let Some(admin) = admin_account(&client).await else {
        return;
    };
    let customer = register_customer(&client).await;

    let manufacturer = create_manufacturer(&client, &admin).await;
    let marker = Uuid::new_v4().simple().to_string();
    let name = format!("Zinc Lozenges {marker}");
    create_product(&client, &admin, manufacturer, &name).await;

    let (status, results) = get_json(
        &client,
        &customer.token,
        &format!("/api/products/search?q={}", marker.to_uppercase()),
    )
    .await;
    assert_eq!(status, 200);
    let names: Vec<&str> = results
        .as_array()
        .expect("results array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(names.contains(&name.as_str()));
}

#[tokio::test]
#[ignore = "Requires a running server and PostgreSQL"]
async fn test_product_mutations_require_admin() {
    let client = client();
    let customer = register_customer(&client).await;

    let resp = client
        .post(format!("{}/api/products", base_url()))
        .bearer_auth(&customer.token)
        .json(&json!({
            "name": "nope",
            "manufacturer": 1,
            "price": "1.00",
            "stock_level": 1,
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), 403);
}
