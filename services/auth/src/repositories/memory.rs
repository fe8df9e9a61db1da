//! In-memory user store for tests

use anyhow::Result;
use async_trait::async_trait;
use common::auth::Role;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{CredentialUpdate, User};

/// Test double for [`UserStore`]; keeps insertion order like `created_at`
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag of an account
    pub async fn set_active(&self, id: Uuid, is_active: bool) {
        if let Some(user) = self.users.lock().await.iter_mut().find(|u| u.id == id) {
            user.is_active = is_active;
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UsernameTaken);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn list_by_roles(&self, roles: &[Role]) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        Ok(users.iter().filter(|u| roles.contains(&u.role)).cloned().collect())
    }

    async fn agents_visible_to(&self, admin_id: Uuid) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        let created_by_super_admin = |creator: Uuid| {
            users
                .iter()
                .any(|u| u.id == creator && u.role == Role::SuperAdmin)
        };

        Ok(users
            .iter()
            .filter(|u| u.role == Role::Agent)
            .filter(|u| match u.created_by {
                None => true,
                Some(creator) => creator == admin_id || created_by_super_admin(creator),
            })
            .cloned()
            .collect())
    }

    async fn set_password(&self, id: Uuid, role: Role, password_hash: &str) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.iter_mut().find(|u| u.id == id && u.role == role) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid, role: Role) -> Result<bool> {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|u| !(u.id == id && u.role == role));
        if users.len() == before {
            return Ok(false);
        }

        for user in users.iter_mut().filter(|u| u.created_by == Some(id)) {
            user.created_by = None;
        }
        Ok(true)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        update: &CredentialUpdate,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        if let Some(username) = &update.username {
            if users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(StoreError::UsernameTaken);
            }
        }

        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(password_hash) = &update.password_hash {
            user.password_hash = password_hash.clone();
        }
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        Ok(true)
    }

    async fn set_target(&self, id: Uuid, target_monthly: Decimal) -> Result<bool> {
        let mut users = self.users.lock().await;
        match users.iter_mut().find(|u| u.id == id && u.role == Role::Agent) {
            Some(user) => {
                user.target_monthly = target_monthly;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn super_admin_exists(&self) -> Result<bool> {
        let users = self.users.lock().await;
        Ok(users.iter().any(|u| u.role == Role::SuperAdmin))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
