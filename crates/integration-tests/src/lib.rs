//! Integration tests for Bluebell Pharmacy.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the server
//! cargo run -p bluebell-cli -- migrate
//! cargo run -p bluebell-cli -- seed
//! cargo run -p bluebell-server
//!
//! # Run the ignored end-to-end tests
//! cargo test -p bluebell-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `BLUEBELL_BASE_URL` - Server under test (default: http://localhost:4000)
//! - `BLUEBELL_TEST_ADMIN_EMAIL` / `BLUEBELL_TEST_ADMIN_PASSWORD` -
//!   Credentials of an admin account (create one with
//!   `bluebell admin create`); tests that exercise admin routes skip
//!   gracefully when unset.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("BLUEBELL_BASE_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// Plain HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::new()
}

/// A registered account: its bearer token and user document.
pub struct Account {
    pub token: String,
    pub user: Value,
}

impl Account {
    /// The account's user id.
    ///
    /// # Panics
    ///
    /// Panics if the registration response had no numeric id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.user["id"].as_i64().expect("user id")
    }
}

/// Register a fresh customer account with a unique email.
///
/// # Panics
///
/// Panics if the server is unreachable or registration fails.
pub async fn register_customer(client: &Client) -> Account {
    let email = format!("it-{}@example.com", Uuid::new_v4());
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "displayName": "Integration Test",
            "email": email,
            "password": "integration-test-password",
        }))
        .send()
        .await
        .expect("register request");

    assert_eq!(resp.status(), 201, "registration should succeed");
    let body: Value = resp.json().await.expect("registration body");

    Account {
        token: body["token"].as_str().expect("token").to_string(),
        user: body["user"].clone(),
    }
}

/// Login with the configured admin credentials, if any.
///
/// # Panics
///
/// Panics if credentials are set but wrong.
pub async fn admin_account(client: &Client) -> Option<Account> {
    let email = std::env::var("BLUEBELL_TEST_ADMIN_EMAIL").ok()?;
    let password = std::env::var("BLUEBELL_TEST_ADMIN_PASSWORD").ok()?;

    let resp = client
        .post(format!("{}/api/auth/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("admin login request");

    assert_eq!(resp.status(), 200, "admin login should succeed");
    let body: Value = resp.json().await.expect("admin login body");

    Some(Account {
        token: body["token"].as_str().expect("token").to_string(),
        user: body["user"].clone(),
    })
}

/// GET a JSON endpoint with a bearer token.
///
/// # Panics
///
/// Panics if the request fails to send or the body is not JSON.
pub async fn get_json(client: &Client, token: &str, path: &str) -> (u16, Value) {
    let resp = client
        .get(format!("{}{path}", base_url()))
        .bearer_auth(token)
        .send()
        .await
        .expect("GET request");
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}
