//! Application state shared across handlers

use common::auth::TokenVerifier;
use std::sync::Arc;

use crate::repositories::IncentiveStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncentiveStore>,
    pub verifier: TokenVerifier,
}
