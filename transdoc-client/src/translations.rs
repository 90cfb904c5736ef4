//! Translation job endpoints

use crate::TranslationClient;
use crate::error::{ClientError, Result};
use tracing::debug;
use transdoc_core::domain::job::{JobId, TranslationJob};
use transdoc_core::dto::translation::SubmitTranslation;

impl TranslationClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a document for translation
    ///
    /// # Returns
    /// The created job, normally in `pending` status
    ///
    /// # Example
    /// ```no_run
    /// # use transdoc_client::TranslationClient;
    /// # use transdoc_core::dto::translation::SubmitTranslation;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = TranslationClient::new("http://localhost:3000");
    /// let job = client.submit_translation(SubmitTranslation {
    ///     file_name: "hello.txt".to_string(),
    ///     source_language: "en".to_string(),
    ///     target_language: "es".to_string(),
    ///     file_content: "Hello world".to_string(),
    ///     file_type: "text/plain".to_string(),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_translation(&self, req: SubmitTranslation) -> Result<TranslationJob> {
        let url = self.url("/translations");
        debug!(
            "Submitting {} ({}, {} bytes encoded)",
            req.file_name,
            req.file_type,
            req.file_content.len()
        );
        let request = self.authorize(self.client.post(&url).json(&req)).await;
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// List all jobs owned by the current identity
    pub async fn list_translations(&self) -> Result<Vec<TranslationJob>> {
        let url = self.url("/translations");
        let response = self.authorize(self.client.get(&url)).await.send().await?;

        self.handle_response(response).await
    }

    /// Get a single job by ID
    pub async fn get_translation(&self, job_id: &JobId) -> Result<TranslationJob> {
        let url = self.url(&format!("/translations/{}", job_id));
        let response = self.authorize(self.client.get(&url)).await.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(job_id.to_string()));
        }

        self.handle_response(response).await
    }

    // =============================================================================
    // Downloads
    // =============================================================================

    /// Download the translated document through the authenticated endpoint
    pub async fn download_translation(&self, job_id: &JobId) -> Result<Vec<u8>> {
        let url = self.url(&format!("/translations/{}/download", job_id));
        let response = self.authorize(self.client.get(&url)).await.send().await?;

        self.handle_bytes_response(response).await
    }

    /// Fetch a pre-authorized download reference
    ///
    /// The reference already carries its authorization, so no bearer
    /// credential is attached.
    pub async fn fetch_reference(&self, reference: &str) -> Result<Vec<u8>> {
        let response = self.client.get(reference).send().await?;

        self.handle_bytes_response(response).await
    }
}
