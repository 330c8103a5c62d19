use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use crate::account::errors::StoreError;
use crate::account::models::EmailAddress;
use crate::account::models::Role;
use crate::account::models::User;
use crate::account::models::UserId;
use crate::account::models::Username;
use crate::account::ports::CredentialStore;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, created_at, updated_at, deleted_at";

pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn user_from_row(row: PgRow) -> Result<User, StoreError> {
    let id: Uuid = row.try_get("id").map_err(database_error)?;
    let username: String = row.try_get("username").map_err(database_error)?;
    let email: String = row.try_get("email").map_err(database_error)?;
    let role: String = row.try_get("role").map_err(database_error)?;

    Ok(User {
        id: UserId(id),
        username: Username::new(username)
            .map_err(|e| StoreError::CorruptRecord(format!("user {}: {}", id, e)))?,
        email: EmailAddress::new(email)
            .map_err(|e| StoreError::CorruptRecord(format!("user {}: {}", id, e)))?,
        password_hash: row.try_get("password_hash").map_err(database_error)?,
        role: role
            .parse::<Role>()
            .map_err(|e| StoreError::CorruptRecord(format!("user {}: {}", id, e)))?,
        created_at: row.try_get("created_at").map_err(database_error)?,
        updated_at: row.try_get("updated_at").map_err(database_error)?,
        deleted_at: row.try_get("deleted_at").map_err(database_error)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn create(&self, user: User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.0)
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("users_username_key") {
                        return StoreError::DuplicateUsername(user.username.to_string());
                    }
                    if db_err.constraint() == Some("users_email_key") {
                        return StoreError::DuplicateEmail(user.email.to_string());
                    }
                }
            }
            database_error(e)
        })?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );

        sqlx::query(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(user_from_row)
            .transpose()
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        );

        sqlx::query(&query)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .map(user_from_row)
            .transpose()
    }

    async fn exists_by_id(&self, id: &UserId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL)",
        )
        .bind(id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn update_password(
        &self,
        id: &UserId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {} FROM users WHERE deleted_at IS NULL ORDER BY created_at, id LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        sqlx::query(&query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?
            .into_iter()
            .map(user_from_row)
            .collect()
    }

    async fn soft_delete(&self, id: &UserId, deleted_at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.0)
        .bind(deleted_at)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
