use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::users::repo_types::{NewUser, User};

/// Keyed persistence for user accounts.
///
/// Every method touches a single record (or reads), so backends only need
/// single-record atomicity.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and return it with its store-assigned id.
    async fn add(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find(&self, id: i64) -> anyhow::Result<Option<User>>;
    /// Overwrite the record with `user.id`. Returns false when it does not exist.
    async fn update(&self, user: &User) -> anyhow::Result<bool>;
    /// Returns false when nothing was removed.
    async fn remove(&self, id: i64) -> anyhow::Result<bool>;
    async fn count(&self) -> anyhow::Result<i64>;
    async fn get_all(&self) -> anyhow::Result<Vec<User>>;

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }
}

/// Unique-constraint violation raised by the database on `username`.
#[derive(Debug, thiserror::Error)]
#[error("username already taken")]
pub struct UsernameTaken;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique(e: sqlx::Error) -> anyhow::Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => UsernameTaken.into(),
        _ => anyhow::Error::new(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn add(&self, user: NewUser) -> anyhow::Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, auth_token)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, auth_token, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.auth_token)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique)
        .context("insert user")?;
        debug!(user_id = created.id, "user inserted");
        Ok(created)
    }

    async fn find(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, auth_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, auth_token, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET username = $2, email = $3, password_hash = $4, auth_token = $5,
                   updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.auth_token)
        .execute(&self.db)
        .await
        .map_err(map_unique)
        .context("update user")?;
        Ok(res.rows_affected() == 1)
    }

    async fn remove(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() == 1)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await
            .context("count users")?;
        Ok(n)
    }

    async fn get_all(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, auth_token, created_at, updated_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(rows)
    }
}
