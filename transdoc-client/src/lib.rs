//! Transdoc HTTP Client
//!
//! A simple, type-safe HTTP client for the document translation REST API.
//!
//! Requests to `/translations` carry a bearer credential obtained per request
//! from the configured [`IdentityProvider`]. When there is no session the
//! request goes out unauthenticated and the backend answers with an auth error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use transdoc_client::{TranslationClient, TokenIdentity};
//! use transdoc_core::domain::user::User;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let user = User {
//!         id: "user-1".to_string(),
//!         email: "ana@example.com".to_string(),
//!         name: "Ana".to_string(),
//!     };
//!     let client = TranslationClient::new("https://api.example.com/prod")
//!         .with_identity(Arc::new(TokenIdentity::new("id-token", user)));
//!
//!     for job in client.list_translations().await? {
//!         println!("{} {}", job.file_name, job.status);
//!     }
//!     Ok(())
//! }
//! ```

mod api;
pub mod error;
pub mod identity;
mod languages;
mod translations;

// Re-export commonly used types
pub use api::TranslationApi;
pub use error::{ClientError, Result};
pub use identity::{AuthError, Credential, IdentityProvider, TokenIdentity};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// HTTP client for the translation REST API
///
/// Endpoints are organized into logical groups:
/// - Reference data (languages)
/// - Translation jobs (submit, list, get)
/// - Downloads (authenticated endpoint and pre-authorized references)
#[derive(Clone)]
pub struct TranslationClient {
    /// Base URL of the API (e.g., "https://api.example.com/prod")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Source of bearer credentials
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl TranslationClient {
    /// Create a new client without an identity
    ///
    /// # Example
    /// ```
    /// use transdoc_client::TranslationClient;
    ///
    /// let client = TranslationClient::new("http://localhost:3000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use transdoc_client::TranslationClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = TranslationClient::with_client("http://localhost:3000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            identity: None,
        }
    }

    /// Attach the identity provider used for bearer credentials
    pub fn with_identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the current session's bearer credential, if any
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(identity) = &self.identity else {
            return request;
        };

        match identity.current_session().await {
            Ok(Some(credential)) => request.bearer_auth(credential.token()),
            Ok(None) => {
                debug!("No active session, sending request without credential");
                request
            }
            Err(e) => {
                warn!("Failed to read session, sending request without credential: {}", e);
                request
            }
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response carrying a raw byte payload
    async fn handle_bytes_response(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let response = self.check_status(response).await?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

impl std::fmt::Debug for TranslationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationClient")
            .field("base_url", &self.base_url)
            .field("has_identity", &self.identity.is_some())
            .finish()
    }
}
