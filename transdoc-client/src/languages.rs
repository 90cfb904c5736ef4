//! Language reference endpoint

use crate::TranslationClient;
use crate::error::Result;
use transdoc_core::domain::language::Language;

impl TranslationClient {
    /// List the languages the backend can translate between
    ///
    /// This endpoint is public; no credential is attached.
    pub async fn list_languages(&self) -> Result<Vec<Language>> {
        let url = self.url("/languages");
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
