//! Repositories for database operations

use anyhow::Result;
use async_trait::async_trait;
use common::auth::Role;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CredentialUpdate, User};

#[cfg(test)]
pub mod memory;
pub mod user;

/// Failures of writes that touch the unique username
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Username already exists")]
    UsernameTaken,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Every account holding one of `roles`, oldest first
    async fn list_by_roles(&self, roles: &[Role]) -> Result<Vec<User>>;

    /// Agents an admin may see: its own, those created by a super admin, and
    /// those without a recorded creator
    async fn agents_visible_to(&self, admin_id: Uuid) -> Result<Vec<User>>;

    /// Replace the hash of the account `id` if it holds `role`
    async fn set_password(&self, id: Uuid, role: Role, password_hash: &str) -> Result<bool>;

    /// Remove the account `id` if it holds `role`
    async fn delete(&self, id: Uuid, role: Role) -> Result<bool>;

    async fn update_credentials(
        &self,
        id: Uuid,
        update: &CredentialUpdate,
    ) -> Result<bool, StoreError>;

    /// Set the monthly target of the agent `id`
    async fn set_target(&self, id: Uuid, target_monthly: Decimal) -> Result<bool>;

    async fn super_admin_exists(&self) -> Result<bool>;

    async fn health_check(&self) -> Result<bool>;
}
