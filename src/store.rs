use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Persistence failures, with uniqueness violations kept distinct so the
/// caller can answer 409 instead of 500.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::DuplicateEmail`] if the
    /// email is already taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Look up a user by email. Absence is not an error.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Other(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(classify)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(classify)?;
        Ok(user)
    }
}

/// In-memory store for tests. The real uniqueness guarantee lives in the
/// database constraint; this mirrors it with a map keyed by email.
#[cfg(test)]
pub(crate) struct MemoryUserStore {
    users: std::sync::Mutex<std::collections::HashMap<String, User>>,
}

#[cfg(test)]
impl MemoryUserStore {
    pub(crate) fn new() -> Self {
        Self {
            users: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_keeps_non_unique_errors_generic() {
        let err = classify(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Other(_)));
    }

    #[tokio::test]
    async fn memory_store_enforces_unique_email() {
        let store = MemoryUserStore::new();
        store.create("a@b.com", "hash-one").await.expect("first insert");
        let err = store.create("a@b.com", "hash-two").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn memory_store_absence_is_not_an_error() {
        let store = MemoryUserStore::new();
        let found = store.find_by_email("nobody@b.com").await.expect("lookup");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn memory_store_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create("a@b.com", "hash").await.expect("insert");
        let found = store.find_by_email("A@B.com").await.expect("lookup");
        assert!(found.is_none());
    }
}
