//! Configuration module
//!
//! Defines all configurable parameters for the dashboard: backend connection,
//! credentials, polling cadence and where downloads land.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use transdoc_client::{IdentityProvider, TokenIdentity, TranslationClient};
use transdoc_core::domain::user::User;

use crate::scheduler::poller::DEFAULT_POLL_INTERVAL;
use crate::session;

/// CLI configuration
///
/// Intervals are configurable so the poller can be tuned for slow networks;
/// the poll interval must stay above the expected round-trip of one refresh.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the translation API (e.g., "https://api.example.com/prod")
    pub api_url: String,

    /// Bearer token issued by the identity provider
    pub token: Option<String>,

    /// Email of the signed-in user, used when the token carries no claims
    pub user: Option<String>,

    /// How often to re-fetch jobs while any is still active
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    pub http_timeout: Duration,

    /// Directory translated documents are written to
    pub output_dir: PathBuf,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            token: None,
            user: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_timeout: Duration::from_secs(30),
            output_dir: PathBuf::from("."),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.http_timeout.is_zero() {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            anyhow::bail!("token cannot be blank");
        }

        Ok(())
    }

    /// Builds the identity provider for the configured credential
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        let Some(token) = &self.token else {
            return Arc::new(TokenIdentity::anonymous());
        };

        let user = session::user_from_id_token(token)
            .or_else(|| self.user.as_deref().map(user_from_email))
            .unwrap_or_else(|| user_from_email("unknown"));

        Arc::new(TokenIdentity::new(token.clone(), user))
    }

    /// Builds the API client, authenticated through `identity`
    pub fn client(&self, identity: Arc<dyn IdentityProvider>) -> Result<TranslationClient> {
        let http_client = reqwest::Client::builder()
            .timeout(self.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(TranslationClient::with_client(&self.api_url, http_client).with_identity(identity))
    }
}

fn user_from_email(email: &str) -> User {
    User {
        id: email.to_string(),
        email: email.to_string(),
        name: email.to_string(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:3000".to_string())
    }
}
