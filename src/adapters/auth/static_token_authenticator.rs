// Authenticator backed by a pre-issued access token.
//
// Purpose
// - Hold the session state of the single user this service acts for.
// - Notify registered callbacks on every login state change.
//
// Responsibilities
// - `token` only hands out the token while logged in.
// - `revoke_access` ends the session like `logout`. Logging in again restores it.

use crate::core::ports::{AuthError, Authenticator, LoginStateCallback};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

pub struct StaticTokenAuthenticator {
    user_name: String,
    token: Option<String>,
    logged_in: AtomicBool,
    callbacks: Mutex<Vec<LoginStateCallback>>,
}

impl StaticTokenAuthenticator {
    pub fn new(user_name: impl Into<String>, token: Option<String>) -> Self {
        Self {
            user_name: user_name.into(),
            token,
            logged_in: AtomicBool::new(false),
            callbacks: Mutex::default(),
        }
    }

    fn set_logged_in(&self, logged_in: bool) {
        if self.logged_in.swap(logged_in, Ordering::SeqCst) == logged_in {
            return;
        }
        info!(logged_in, user = %self.user_name, "login state changed");
        let callbacks = self.callbacks.lock().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.iter() {
            callback(logged_in);
        }
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn login(&self) -> Result<(), AuthError> {
        if self.token.is_none() {
            return Err(AuthError::MissingToken);
        }
        self.set_logged_in(true);
        Ok(())
    }

    async fn logout(&self) {
        self.set_logged_in(false);
    }

    async fn revoke_access(&self) {
        warn!(user = %self.user_name, "revoking access");
        self.set_logged_in(false);
    }

    fn token(&self) -> Result<String, AuthError> {
        if !self.is_logged_in() {
            return Err(AuthError::NotLoggedIn);
        }
        self.token.clone().ok_or(AuthError::MissingToken)
    }

    fn user_name(&self) -> Option<String> {
        self.is_logged_in().then(|| self.user_name.clone())
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn on_login_state_changed(&self, callback: LoginStateCallback) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}
