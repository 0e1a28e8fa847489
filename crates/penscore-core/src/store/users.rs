use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use super::Database;
use crate::error::StoreError;
use crate::models::User;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
    })
}

fn load_user(conn: &Connection, user_id: i64) -> Result<Option<User>, StoreError> {
    let user = conn
        .query_row(
            "SELECT id, name, email, password_hash FROM users WHERE id = ?1",
            params![user_id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

impl Database {
    /// Insert a user. Fails with [`StoreError::Duplicate`] if the email is taken.
    pub async fn create_user(
        &self,
        name: String,
        email: String,
        password_hash: String,
    ) -> Result<User, StoreError> {
        self.execute(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO users (name, email, password_hash) VALUES (?1, ?2, ?3)",
                params![name, email, password_hash],
            );

            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(StoreError::Duplicate("email"));
                }
                Err(err) => return Err(err.into()),
            }

            let user_id = conn.last_insert_rowid();
            load_user(conn, user_id)?.ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))
        })
        .await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        self.execute(move |conn| load_user(conn, user_id)).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_string();
        self.execute(move |conn| {
            let user = conn
                .query_row(
                    "SELECT id, name, email, password_hash FROM users WHERE email = ?1",
                    params![email],
                    row_to_user,
                )
                .optional()?;
            Ok(user)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::store::test_support::temp_database;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (_dir, db) = temp_database();

        let user = db
            .create_user("Asha".into(), "asha@example.com".into(), "hash".into())
            .await
            .unwrap();
        assert_eq!(user.name, "Asha");

        let found = db.find_user_by_email("asha@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(db.get_user(user.id).await.unwrap().unwrap().email, "asha@example.com");

        assert!(db.find_user_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(db.get_user(user.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let (_dir, db) = temp_database();

        db.create_user("A".into(), "same@example.com".into(), "h1".into())
            .await
            .unwrap();
        let second = db
            .create_user("B".into(), "same@example.com".into(), "h2".into())
            .await;

        assert!(matches!(second, Err(StoreError::Duplicate("email"))));
    }
}
