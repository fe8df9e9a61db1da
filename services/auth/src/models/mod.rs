//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{
    CredentialUpdate, CredentialView, CredentialsPayload, LoginCredentials, LoginResponse,
    LoginUser, MeResponse, NewAccount, PasswordPayload, TargetPayload, User, UserView,
};
