//! Account operations: login, bootstrap and administration of admins and agents

use common::{
    auth::{AuthUser, Role, STAFF, authorize},
    database::fits_money_column,
};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult, parse_id},
    jwt::JwtService,
    models::{
        CredentialUpdate, CredentialView, CredentialsPayload, LoginCredentials, LoginResponse,
        LoginUser, MeResponse, NewAccount, User, UserView,
    },
    password::{hash_password, verify_password},
    rate_limiter::RateLimiter,
    repositories::UserStore,
    validation::{validate_password, validate_username},
};

const SUPER_ADMIN_ONLY: &[Role] = &[Role::SuperAdmin];

/// Check credentials and issue an access token
pub async fn login<S: UserStore + ?Sized>(
    store: &S,
    jwt: &JwtService,
    throttle: &RateLimiter,
    credentials: &LoginCredentials,
) -> AuthResult<LoginResponse> {
    if throttle.is_locked(&credentials.username).await {
        warn!("Login refused for locked username {}", credentials.username);
        return Err(AuthError::TooManyAttempts);
    }

    let user = match store.find_by_username(&credentials.username).await? {
        Some(user) if verify_password(&credentials.password, &user.password_hash)? => user,
        _ => {
            throttle.record_failure(&credentials.username).await;
            warn!("Invalid credentials for {}", credentials.username);
            return Err(AuthError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    if !user.is_active {
        return Err(AuthError::Unauthorized("Account is deactivated".to_string()));
    }

    throttle.reset(&credentials.username).await;
    let access_token = jwt.generate_access_token(&user)?;
    info!("User {} logged in as {}", user.username, user.role);

    Ok(LoginResponse {
        access_token,
        token_type: "bearer",
        user: LoginUser {
            id: user.id,
            username: user.username,
            role: user.role,
            name: user.name,
        },
    })
}

/// The caller's own account
pub async fn me<S: UserStore + ?Sized>(store: &S, actor: &AuthUser) -> AuthResult<MeResponse> {
    store
        .find_by_id(actor.id)
        .await?
        .map(MeResponse::from)
        .ok_or_else(|| AuthError::Unauthorized("User not found".to_string()))
}

/// Create the single super admin unless one already exists. Returns whether
/// an account was created.
pub async fn bootstrap_super_admin<S: UserStore + ?Sized>(
    store: &S,
    username: &str,
    password: &str,
    name: &str,
) -> anyhow::Result<bool> {
    if store.super_admin_exists().await? {
        return Ok(false);
    }

    validate_username(username)?;
    validate_password(password)?;

    let user = User::new(
        username.to_string(),
        hash_password(password)?,
        Role::SuperAdmin,
        name.to_string(),
        None,
    );
    store.insert(&user).await?;

    info!("Super admin {} created", username);
    Ok(true)
}

async fn create_account<S: UserStore + ?Sized>(
    store: &S,
    creator: &AuthUser,
    role: Role,
    account: NewAccount,
) -> AuthResult<Uuid> {
    validate_username(&account.username)?;
    validate_password(&account.password)?;

    let name = account
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| account.username.clone());

    let user = User::new(
        account.username,
        hash_password(&account.password)?,
        role,
        name,
        Some(creator.id),
    );
    store.insert(&user).await?;

    info!("{} {} created by {}", role, user.username, creator.username);
    Ok(user.id)
}

pub async fn create_admin<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    account: NewAccount,
) -> AuthResult<Uuid> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    create_account(store, actor, Role::Admin, account).await
}

pub async fn create_agent<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    account: NewAccount,
) -> AuthResult<Uuid> {
    authorize(actor, STAFF)?;
    create_account(store, actor, Role::Agent, account).await
}

pub async fn list_admins<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> AuthResult<Vec<UserView>> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    let admins = store.list_by_roles(&[Role::Admin]).await?;
    Ok(admins.into_iter().map(UserView::from).collect())
}

/// Credential view of every account holding one of `roles`
pub async fn credential_views<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    roles: &[Role],
) -> AuthResult<Vec<CredentialView>> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    let users = store.list_by_roles(roles).await?;
    Ok(users.into_iter().map(CredentialView::from).collect())
}

pub async fn change_admin_password<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    admin_id: &str,
    new_password: Option<&str>,
) -> AuthResult<()> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    let new_password = new_password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| AuthError::BadRequest("New password is required".to_string()))?;
    validate_password(new_password)?;
    let admin_id = parse_id(admin_id, "Admin not found")?;

    let hash = hash_password(new_password)?;
    if !store.set_password(admin_id, Role::Admin, &hash).await? {
        return Err(AuthError::NotFound("Admin not found".to_string()));
    }

    info!("Password of admin {} changed by {}", admin_id, actor.username);
    Ok(())
}

/// Delete an admin; agents it created stay, without a creator
pub async fn delete_admin<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    admin_id: &str,
) -> AuthResult<()> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    let admin_id = parse_id(admin_id, "Admin not found")?;

    if !store.delete(admin_id, Role::Admin).await? {
        return Err(AuthError::NotFound("Admin not found".to_string()));
    }

    info!("Admin {} deleted by {}", admin_id, actor.username);
    Ok(())
}

/// Rewrite username, password or name of an admin or agent
pub async fn update_credentials<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    user_id: &str,
    payload: CredentialsPayload,
) -> AuthResult<()> {
    authorize(actor, SUPER_ADMIN_ONLY)?;
    let user_id = parse_id(user_id, "User not found")?;

    let target = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;
    if target.role == Role::SuperAdmin {
        return Err(AuthError::Forbidden(
            "Cannot edit super admin credentials".to_string(),
        ));
    }

    let username = payload.username.filter(|username| !username.is_empty());
    if let Some(username) = &username {
        validate_username(username)?;
    }
    let password_hash = match payload.password.filter(|password| !password.is_empty()) {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password)?)
        }
        None => None,
    };

    let update = CredentialUpdate {
        username,
        password_hash,
        name: payload.name,
    };
    if update.is_empty() {
        return Ok(());
    }

    if !store.update_credentials(user_id, &update).await? {
        return Err(AuthError::NotFound("User not found".to_string()));
    }

    info!("Credentials of {} updated by {}", user_id, actor.username);
    Ok(())
}

/// Agents the caller may manage
pub async fn list_agents<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
) -> AuthResult<Vec<UserView>> {
    authorize(actor, STAFF)?;

    let agents = match actor.role {
        Role::SuperAdmin => store.list_by_roles(&[Role::Agent]).await?,
        _ => store.agents_visible_to(actor.id).await?,
    };
    Ok(agents.into_iter().map(UserView::from).collect())
}

pub async fn set_agent_target<S: UserStore + ?Sized>(
    store: &S,
    actor: &AuthUser,
    agent_id: &str,
    target_monthly: Option<Decimal>,
) -> AuthResult<()> {
    authorize(actor, STAFF)?;
    let target_monthly = target_monthly
        .filter(|target| *target >= Decimal::ZERO && fits_money_column(*target))
        .ok_or_else(|| AuthError::BadRequest("Valid target_monthly is required".to_string()))?;
    let agent_id = parse_id(agent_id, "Agent not found")?;

    if !store.set_target(agent_id, target_monthly).await? {
        return Err(AuthError::NotFound("Agent not found".to_string()));
    }

    info!("Target of agent {} set to {}", agent_id, target_monthly);
    Ok(())
}
