//! Backend seam
//!
//! The dashboard talks to the backend through this trait so the poller and
//! services can be exercised against in-memory fakes.

use async_trait::async_trait;
use transdoc_core::domain::job::{JobId, TranslationJob};
use transdoc_core::domain::language::Language;
use transdoc_core::dto::translation::SubmitTranslation;

use crate::TranslationClient;
use crate::error::Result;

/// Operations the dashboard needs from the translation backend
#[async_trait]
pub trait TranslationApi: Send + Sync {
    async fn list_languages(&self) -> Result<Vec<Language>>;

    async fn submit_translation(&self, req: SubmitTranslation) -> Result<TranslationJob>;

    /// Full job list for the current identity
    async fn list_translations(&self) -> Result<Vec<TranslationJob>>;

    async fn get_translation(&self, job_id: &JobId) -> Result<TranslationJob>;

    /// Raw bytes from the authenticated download endpoint
    async fn download_translation(&self, job_id: &JobId) -> Result<Vec<u8>>;

    /// Raw bytes behind a pre-authorized download reference
    async fn fetch_reference(&self, reference: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl TranslationApi for TranslationClient {
    async fn list_languages(&self) -> Result<Vec<Language>> {
        TranslationClient::list_languages(self).await
    }

    async fn submit_translation(&self, req: SubmitTranslation) -> Result<TranslationJob> {
        TranslationClient::submit_translation(self, req).await
    }

    async fn list_translations(&self) -> Result<Vec<TranslationJob>> {
        TranslationClient::list_translations(self).await
    }

    async fn get_translation(&self, job_id: &JobId) -> Result<TranslationJob> {
        TranslationClient::get_translation(self, job_id).await
    }

    async fn download_translation(&self, job_id: &JobId) -> Result<Vec<u8>> {
        TranslationClient::download_translation(self, job_id).await
    }

    async fn fetch_reference(&self, reference: &str) -> Result<Vec<u8>> {
        TranslationClient::fetch_reference(self, reference).await
    }
}
