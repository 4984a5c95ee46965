//! Seed the database: the chat support identity plus a small demo catalog.
//!
//! Safe to run repeatedly; every insert is keyed on a unique name or email
//! and skips rows that already exist.

use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use tracing::info;

use bluebell_core::{Email, Price};
use bluebell_server::db::users::UserRepository;
use bluebell_server::services::auth::hash_password;

use super::CommandError;

/// Demo categories.
const CATEGORIES: &[(&str, &str)] = &[
    ("Pain relief", "Analgesics and anti-inflammatories"),
    ("Cold & flu", "Decongestants, cough syrups, lozenges"),
    ("Vitamins", "Daily supplements and multivitamins"),
    ("First aid", "Bandages, antiseptics, burn care"),
];

/// Demo manufacturers.
const MANUFACTURERS: &[(&str, &str)] = &[
    ("Acme Labs", "Generic medicines at scale"),
    ("Verdant Health", "Plant-based supplements"),
    ("NordMed", "Scandinavian OTC brand"),
];

/// Demo products: (name, category, manufacturer, price cents, stock).
const PRODUCTS: &[(&str, &str, &str, i64, i32)] = &[
    ("Ibuprofen 200mg (24 tablets)", "Pain relief", "Acme Labs", 799, 120),
    ("Paracetamol 500mg (16 tablets)", "Pain relief", "Acme Labs", 449, 200),
    ("Vitamin C 1000mg (60 tablets)", "Vitamins", "Verdant Health", 1299, 80),
    ("Multivitamin Daily (90 tablets)", "Vitamins", "Verdant Health", 1899, 60),
    ("Cough Syrup 200ml", "Cold & flu", "NordMed", 949, 45),
    ("Nasal Spray 10ml", "Cold & flu", "NordMed", 699, 70),
    ("Adhesive Bandages (40 pack)", "First aid", "Acme Labs", 549, 150),
    ("Antiseptic Cream 30g", "First aid", "NordMed", 629, 90),
];

/// Seed the support identity and demo catalog.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    seed_support_identity(&pool).await?;
    seed_catalog(&pool).await?;

    info!("Seeding complete");
    Ok(())
}

/// Ensure the shared chat support identity exists.
///
/// The server refuses to start without this user; its email comes from
/// `BLUEBELL_SUPPORT_EMAIL`.
async fn seed_support_identity(pool: &PgPool) -> Result<(), CommandError> {
    let email_value = std::env::var("BLUEBELL_SUPPORT_EMAIL")
        .unwrap_or_else(|_| "support@bluebellpharmacy.example".to_string());
    let email = Email::parse(&email_value)?;

    let users = UserRepository::new(pool);
    if users.get_by_email(&email).await?.is_some() {
        info!(email = %email, "Support identity already exists");
        return Ok(());
    }

    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    let password_hash = hash_password(&password)?;

    let user = users
        .create(&email, "Bluebell Support", &password_hash, true)
        .await?;

    info!(user_id = %user.id, email = %email, "Support identity created");
    #[allow(clippy::print_stdout)]
    {
        println!("Support identity password for {email}: {password}");
    }

    Ok(())
}

/// Insert the demo catalog, skipping anything already present.
async fn seed_catalog(pool: &PgPool) -> Result<(), CommandError> {
    for (name, description) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (name, description) VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    for (name, description) in MANUFACTURERS {
        sqlx::query(
            "INSERT INTO manufacturers (name, description) VALUES ($1, $2)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    let mut inserted = 0_u32;
    for (name, category, manufacturer, cents, stock) in PRODUCTS {
        let result = sqlx::query(
            "INSERT INTO products
                 (name, category_id, manufacturer_id, price, description, stock_level)
             SELECT $1, c.id, m.id, $4, NULL, $5
             FROM categories c, manufacturers m
             WHERE c.name = $2 AND m.name = $3
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(category)
        .bind(manufacturer)
        .bind(Price::from_cents(*cents))
        .bind(stock)
        .execute(pool)
        .await?;
        inserted += u32::try_from(result.rows_affected()).unwrap_or(0);
    }

    info!(
        categories = CATEGORIES.len(),
        manufacturers = MANUFACTURERS.len(),
        new_products = inserted,
        "Catalog seeded"
    );
    Ok(())
}
