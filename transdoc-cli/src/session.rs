//! Session context
//!
//! Owns the "current user" for the lifetime of a dashboard. It is created
//! once, probed against the identity provider on startup and torn down by
//! sign-out. Components that depend on the identity subscribe to it instead
//! of reading global state.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use transdoc_client::{AuthError, IdentityProvider};
use transdoc_core::domain::user::User;

/// Explicitly owned identity state
pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    current: watch::Sender<Option<User>>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (current, _) = watch::channel(None);
        Self { provider, current }
    }

    /// Probes the provider for an existing session
    ///
    /// A provider error is treated as "not signed in".
    pub async fn initialize(&self) -> Option<User> {
        let user = match self.provider.current_user().await {
            Ok(user) => user,
            Err(e) => {
                warn!("Failed to probe existing session: {}", e);
                None
            }
        };

        if let Some(user) = &user {
            info!("Resumed session for {}", user.email);
        }
        self.current.send_replace(user.clone());
        user
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    /// Receives every identity change, starting from the current value
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    /// Signs out and clears the local identity
    ///
    /// The local identity is cleared even when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.provider.sign_out().await;
        if let Err(e) = &result {
            warn!("Identity provider sign-out failed: {}", e);
        }
        self.current.send_replace(None);
        result
    }
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    #[serde(rename = "cognito:username")]
    username: Option<String>,
}

/// Reads the user out of an OpenID Connect ID token
///
/// The signature is not checked; the backend does that. Returns `None` for
/// anything that is not a three-part JWT with a `sub` claim.
pub fn user_from_id_token(token: &str) -> Option<User> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes).ok()?;

    let email = claims.email.unwrap_or_default();
    let name = claims
        .name
        .or(claims.username)
        .unwrap_or_else(|| email.clone());

    Some(User {
        id: claims.sub,
        email,
        name,
    })
}
