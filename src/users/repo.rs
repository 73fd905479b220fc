use axum::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::repo_types::{User, UserPatch};
use crate::error::AppError;

/// Persistence for user records. Implementations enforce email uniqueness
/// and report a collision as [`AppError::Conflict`].
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError>;
    /// `Ok(None)` when no record has this id.
    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
    {
        AppError::Conflict
    } else {
        error!(error = %e, "user write failed");
        AppError::Unexpected(anyhow::Error::new(e).context("write user"))
    }
}

fn map_read_error(e: sqlx::Error) -> AppError {
    error!(error = %e, "user read failed");
    AppError::Unexpected(anyhow::Error::new(e).context("read user"))
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_read_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_read_error)
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name          = COALESCE($2, name),
                   email         = COALESCE($3, email),
                   password_hash = COALESCE($4, password_hash),
                   updated_at    = now()
             WHERE id = $1
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)
    }
}
