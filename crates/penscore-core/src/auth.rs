//! Account registration and password login.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{debug, info};

use crate::error::{AuthError, StoreError};
use crate::models::User;
use crate::store::Database;

/// Hash a password into a PHC string with a random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Check a password against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!("Unparseable password hash: {}", e);
            false
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value)
}

/// Create an account. Emails are compared case-insensitively.
pub async fn register(
    db: &Database,
    name: &str,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let name = required(name, "name")?.to_string();
    let email = normalize_email(required(email, "email")?);
    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }

    let hash = hash_password(password)?;
    match db.create_user(name, email, hash).await {
        Ok(user) => {
            info!("Registered user {} ({})", user.id, user.email);
            Ok(user)
        }
        Err(StoreError::Duplicate(_)) => Err(AuthError::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

/// Authenticate by email and password.
pub async fn login(db: &Database, email: &str, password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    let user = db
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        debug!("Password mismatch for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_database;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not a hash"));

        // salted: same input, different strings
        assert_ne!(hash, hash_password("hunter2").unwrap());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_dir, db) = temp_database();

        let user = register(&db, " Meera ", "Meera@Example.com ", "secret").await.unwrap();
        assert_eq!(user.name, "Meera");
        assert_eq!(user.email, "meera@example.com");
        assert_ne!(user.password_hash, "secret");

        let logged_in = login(&db, "MEERA@example.com", "secret").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (_dir, db) = temp_database();

        register(&db, "A", "dup@example.com", "one").await.unwrap();
        let err = register(&db, "B", "DUP@example.com", "two").await.unwrap_err();

        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(err.to_string(), "Email already exists! Try logging in instead.");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_dir, db) = temp_database();
        register(&db, "A", "a@example.com", "right").await.unwrap();

        let wrong_password = login(&db, "a@example.com", "wrong").await.unwrap_err();
        let unknown_email = login(&db, "b@example.com", "right").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), "Invalid credentials!");
        assert_eq!(unknown_email.to_string(), wrong_password.to_string());
    }

    #[tokio::test]
    async fn test_register_requires_fields() {
        let (_dir, db) = temp_database();

        assert!(matches!(
            register(&db, "  ", "x@example.com", "pw").await,
            Err(AuthError::MissingField("name"))
        ));
        assert!(matches!(
            register(&db, "X", "", "pw").await,
            Err(AuthError::MissingField("email"))
        ));
        assert!(matches!(
            register(&db, "X", "x@example.com", "").await,
            Err(AuthError::MissingField("password"))
        ));
    }
}
