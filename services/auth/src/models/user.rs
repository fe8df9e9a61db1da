//! User model and related functionality

use chrono::{DateTime, Utc};
use common::auth::Role;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account of any tier. Ledger fields stay at zero for non-agents.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub target_monthly: Decimal,
    pub coins: Decimal,
    pub deposits: Decimal,
    pub total_sales: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Fresh active account with an empty ledger
    pub fn new(
        username: String,
        password_hash: String,
        role: Role,
        name: String,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            name,
            created_by,
            is_active: true,
            target_monthly: Decimal::ZERO,
            coins: Decimal::ZERO,
            deposits: Decimal::ZERO,
            total_sales: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}

/// User as returned by listings; never carries the hash
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub target_monthly: Decimal,
    pub coins: Decimal,
    pub deposits: Decimal,
    pub total_sales: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            name: user.name,
            created_by: user.created_by,
            is_active: user.is_active,
            target_monthly: user.target_monthly,
            coins: user.coins,
            deposits: user.deposits,
            total_sales: user.total_sales,
            created_at: user.created_at,
        }
    }
}

/// Super-admin credential view
#[derive(Debug, Clone, Serialize)]
pub struct CredentialView {
    #[serde(flatten)]
    pub user: UserView,
    pub has_password: bool,
}

impl From<User> for CredentialView {
    fn from(user: User) -> Self {
        let has_password = !user.password_hash.is_empty();
        Self {
            user: user.into(),
            has_password,
        }
    }
}

/// Fields a super admin may rewrite on another account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        *self == CredentialUpdate::default()
    }
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Body for creating an admin or an agent
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

/// Body of `PUT /super-admin/users/:id/credentials`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Body of `PUT /super-admin/admins/:id/password`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordPayload {
    pub new_password: Option<String>,
}

/// Body of `PUT /admin/agents/:id/target`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetPayload {
    pub target_monthly: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: LoginUser,
}

/// `GET /auth/me`; ledger fields are null for staff
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub coins: Option<Decimal>,
    pub deposits: Option<Decimal>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        let is_agent = user.role == Role::Agent;
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            name: user.name,
            coins: is_agent.then_some(user.coins),
            deposits: is_agent.then_some(user.deposits),
        }
    }
}
