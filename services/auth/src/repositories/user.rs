//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use common::auth::Role;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{CredentialUpdate, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, name, created_by, is_active, \
                            target_monthly, coins, deposits, total_sales, created_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: role.parse().map_err(anyhow::Error::msg)?,
        name: row.try_get("name")?,
        created_by: row.try_get("created_by")?,
        is_active: row.try_get("is_active")?,
        target_monthly: row.try_get("target_monthly")?,
        coins: row.try_get("coins")?,
        deposits: row.try_get("deposits")?,
        total_sales: row.try_get("total_sales")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Turn a unique violation on `username` into [`StoreError::UsernameTaken`]
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::UsernameTaken;
        }
    }
    StoreError::Other(err.into())
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        info!("Creating {} account: {}", user.role, user.username);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, name, created_by, is_active,
                               target_monthly, coins, deposits, total_sales, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(user.created_by)
        .bind(user.is_active)
        .bind(user.target_monthly)
        .bind(user.coins)
        .bind(user.deposits)
        .bind(user.total_sales)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn list_by_roles(&self, roles: &[Role]) -> Result<Vec<User>> {
        let roles: Vec<&str> = roles.iter().map(Role::as_str).collect();
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ANY($1) ORDER BY created_at"
        ))
        .bind(&roles)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn agents_visible_to(&self, admin_id: Uuid) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users u
            WHERE u.role = 'agent'
              AND (
                  u.created_by IS NULL
                  OR u.created_by = $1
                  OR EXISTS (
                      SELECT 1 FROM users c
                      WHERE c.id = u.created_by AND c.role = 'super_admin'
                  )
              )
            ORDER BY u.created_at
            "#
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    async fn set_password(&self, id: Uuid, role: Role, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $3 WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(role.as_str())
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid, role: Role) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        update: &CredentialUpdate,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.username)
        .bind(&update.password_hash)
        .bind(&update.name)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_target(&self, id: Uuid, target_monthly: Decimal) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET target_monthly = $2 WHERE id = $1 AND role = 'agent'")
                .bind(id)
                .bind(target_monthly)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn super_admin_exists(&self) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'super_admin')",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(common::database::health_check(&self.pool).await?)
    }
}
