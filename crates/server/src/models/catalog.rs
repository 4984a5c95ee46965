//! Catalog domain models: products, reviews, categories, manufacturers.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bluebell_core::{CategoryId, ManufacturerId, Price, ProductId, ReviewId};

/// A purchasable product.
///
/// `average_rating` and `ratings_count` are denormalized from the reviews
/// and recomputed in the same transaction as every review change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Option<CategoryId>,
    pub category_name: Option<String>,
    pub manufacturer: ManufacturerId,
    pub manufacturer_name: String,
    pub price: Price,
    pub description: Option<String>,
    #[serde(rename = "stock_level")]
    pub stock_level: i32,
    pub images: Vec<String>,
    pub average_rating: f64,
    pub ratings_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer review on a product.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    #[serde(rename = "name")]
    pub author_name: String,
    pub rating: i16,
    pub comment: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// A product category. Optional on products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// A product manufacturer. Required on products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}
