//! Identity provider seam
//!
//! Sign-in, sign-up and session management live in an external identity
//! provider. The dashboard only needs the capability surface below and a
//! bearer credential per request.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use transdoc_core::domain::user::User;

/// Errors reported by the identity provider, mapped to user-facing messages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password. Please check your credentials.")]
    InvalidCredentials,

    #[error("Please check your email and confirm your account before logging in.")]
    UserNotConfirmed,

    #[error("User not found. Please check your email address.")]
    UserNotFound,

    #[error("{0} is not supported by this identity provider")]
    Unsupported(&'static str),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Maps a provider exception name to an error kind
    ///
    /// Unknown names keep the provider's own message.
    pub fn from_provider_code(code: &str, message: impl Into<String>) -> Self {
        match code {
            "NotAuthorizedException" => Self::InvalidCredentials,
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            "UserNotFoundException" => Self::UserNotFound,
            _ => Self::Provider(message.into()),
        }
    }
}

/// Short-lived bearer credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Capability surface of the external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, display_name: &str)
    -> Result<(), AuthError>;

    async fn confirm_sign_up(&self, email: &str, code: &str) -> Result<(), AuthError>;

    async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Credential for the current session, if one exists and is still valid
    async fn current_session(&self) -> Result<Option<Credential>, AuthError>;

    /// Identity behind the current session
    async fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// Identity backed by a token obtained out-of-band
///
/// Used when the credential comes from configuration (e.g. an ID token issued
/// by the hosted sign-in page). Account management is left to the provider.
pub struct TokenIdentity {
    session: RwLock<Option<(Credential, User)>>,
}

impl TokenIdentity {
    /// Creates an identity with an active session
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            session: RwLock::new(Some((Credential::new(token), user))),
        }
    }

    /// Creates an identity with no session
    pub fn anonymous() -> Self {
        Self {
            session: RwLock::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn sign_up(&self, _email: &str, _password: &str, _name: &str) -> Result<(), AuthError> {
        Err(AuthError::Unsupported("Sign-up"))
    }

    async fn confirm_sign_up(&self, _email: &str, _code: &str) -> Result<(), AuthError> {
        Err(AuthError::Unsupported("Account confirmation"))
    }

    async fn resend_confirmation(&self, _email: &str) -> Result<(), AuthError> {
        Err(AuthError::Unsupported("Resending confirmation codes"))
    }

    async fn sign_in(&self, _email: &str, _password: &str) -> Result<User, AuthError> {
        Err(AuthError::Unsupported("Interactive sign-in"))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut session = self.session.write().await;
        if let Some((_, user)) = session.take() {
            info!("Signed out {}", user.email);
        }
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Credential>, AuthError> {
        let session = self.session.read().await;
        Ok(session.as_ref().map(|(credential, _)| credential.clone()))
    }

    async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let session = self.session.read().await;
        if session.is_none() {
            debug!("No active session");
        }
        Ok(session.as_ref().map(|(_, user)| user.clone()))
    }
}
