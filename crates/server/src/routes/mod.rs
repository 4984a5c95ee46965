//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register        - Create an account, returns a bearer token
//! POST /api/auth/login           - Login, returns a bearer token
//!
//! # Users
//! GET  /api/users/user-info      - Current user
//! GET  /api/users                - All users (admin)
//!
//! # Products
//! GET    /api/products               - Product listing
//! POST   /api/products               - Create product (admin)
//! GET    /api/products/search?q=     - Name search
//! POST   /api/products/searchOCR     - Prescription scan search
//! GET    /api/products/{id}          - Product detail (with reviews)
//! PUT    /api/products/{id}          - Update product (admin)
//! DELETE /api/products/{id}          - Delete product (admin)
//! POST   /api/products/{id}/reviews              - Add review
//! DELETE /api/products/{id}/reviews/{reviewId}   - Delete review
//!
//! # Categories / Manufacturers (same shape)
//! GET/POST /api/categories, GET/PUT/DELETE /api/categories/{id},
//! GET /api/categories/{id}/products
//!
//! # Cart
//! GET    /api/cart                   - Resolved cart
//! POST   /api/cart                   - Add item
//! PUT    /api/cart/{productId}       - Overwrite quantity
//! DELETE /api/cart/{productId}       - Remove line (?decrement=true for one unit)
//! POST   /api/cart/checkout          - Checkout into an order
//!
//! # Orders
//! GET    /api/orders                 - Caller's orders
//! GET    /api/orders/all             - All orders (admin)
//! GET    /api/orders/canceled        - Caller's canceled orders
//! GET    /api/orders/canceled/all    - All canceled orders (admin)
//! PUT    /api/orders/{id}/status     - Set status (admin)
//! DELETE /api/orders/{id}            - Cancel (move to canceled)
//!
//! # Chat
//! GET  /api/chats                    - Conversation list (admin)
//! POST /api/chats                    - Send a message
//! GET  /api/chats/ws                 - Realtime channel (WebSocket)
//! GET  /api/chats/{counterpartyId}   - Conversation history
//! ```

pub mod auth;
pub mod cart;
pub mod categories;
pub mod chat;
pub mod manufacturers;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/manufacturers", manufacturer_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/chats", chat_routes())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/user-info", get(users::user_info))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/search", get(products::search))
        .route("/searchOCR", post(products::search_ocr))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/{id}/reviews", post(products::add_review))
        .route(
            "/{id}/reviews/{reviewId}",
            delete(products::delete_review),
        )
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::remove),
        )
        .route("/{id}/products", get(categories::products))
}

/// Create the manufacturer routes router.
pub fn manufacturer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(manufacturers::list).post(manufacturers::create))
        .route(
            "/{id}",
            get(manufacturers::show)
                .put(manufacturers::update)
                .delete(manufacturers::remove),
        )
        .route("/{id}/products", get(manufacturers::products))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/checkout", post(cart::checkout))
        .route("/{productId}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list))
        .route("/all", get(orders::list_all))
        .route("/canceled", get(orders::list_canceled))
        .route("/canceled/all", get(orders::list_canceled_all))
        .route("/{id}", delete(orders::cancel))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(chat::list_conversations).post(chat::send))
        .route("/ws", get(chat::websocket))
        .route("/{counterpartyId}", get(chat::history))
}
