//! Admin user management.

use rand::Rng;
use rand::distr::Alphanumeric;

use bluebell_core::Email;
use bluebell_server::db::users::UserRepository;
use bluebell_server::services::auth::hash_password;

use super::CommandError;

/// Length of generated passwords.
const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Create an admin user.
///
/// When no password is given, a random one is generated and printed once.
///
/// # Errors
///
/// Returns `CommandError` if the email is invalid, already registered, or
/// the database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: Option<&str>,
) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = super::connect().await?;

    let (password, generated) = match password {
        Some(p) => (p.to_string(), false),
        None => (generate_password(), true),
    };

    let password_hash = hash_password(&password)?;

    let user = UserRepository::new(&pool)
        .create(&email, name, &password_hash, true)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin user created");
    if generated {
        // The only place the password ever appears.
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password for {}: {password}", user.email);
        }
    }

    Ok(())
}

/// Generate a random alphanumeric password.
fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password();
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }
}
