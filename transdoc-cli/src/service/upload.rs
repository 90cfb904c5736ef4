//! Upload submitter
//!
//! Turns a selected file and a language pair into a submission. Validation
//! runs before the file is read, so a refused submission never reaches the
//! backend. A failed upload keeps the selected file for a retry.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use transdoc_client::TranslationApi;
use transdoc_core::domain::job::TranslationJob;
use transdoc_core::domain::language::Language;
use transdoc_core::dto::translation::SubmitTranslation;
use transdoc_core::validation::{
    ValidationError, validate_file_name, validate_language_pair,
};

use crate::scheduler::PollerHandle;

/// The only type the backend decodes from base64
const BASE64_TYPE: &str = "application/pdf";

/// File content ready for the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub content: String,
    pub file_type: String,
}

/// Encodes a document according to its type
///
/// PDFs become base64; anything else, Word documents included, is read as
/// UTF-8 text with invalid sequences replaced.
pub fn encode_document(file_name: &str, bytes: &[u8]) -> EncodedDocument {
    let file_type = mime_guess::from_path(file_name)
        .first_or_text_plain()
        .essence_str()
        .to_string();

    let content = if file_type == BASE64_TYPE {
        STANDARD.encode(bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    EncodedDocument { content, file_type }
}

/// Form state: selected file and language pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadForm {
    pub file: Option<PathBuf>,
    pub source_language: String,
    pub target_language: String,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            file: None,
            source_language: "en".to_string(),
            target_language: "es".to_string(),
        }
    }
}

impl UploadForm {
    /// Why the form cannot be submitted right now, if anything
    pub fn blocker(&self) -> Option<ValidationError> {
        validate_language_pair(&self.source_language, &self.target_language).err()
    }
}

/// Submits documents and tells the poller about new jobs
pub struct UploadSubmitter {
    api: Arc<dyn TranslationApi>,
    poller: Option<PollerHandle>,
    form: UploadForm,
    languages: Vec<Language>,
}

impl UploadSubmitter {
    pub fn new(api: Arc<dyn TranslationApi>) -> Self {
        Self {
            api,
            poller: None,
            form: UploadForm::default(),
            languages: Vec::new(),
        }
    }

    /// Signal `poller` after every successful submission
    pub fn with_poller(mut self, poller: PollerHandle) -> Self {
        self.poller = Some(poller);
        self
    }

    pub fn form(&self) -> &UploadForm {
        &self.form
    }

    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        self.form.file = Some(path.into());
    }

    pub fn clear_file(&mut self) {
        self.form.file = None;
    }

    pub fn set_source_language(&mut self, code: &str) {
        self.form.source_language = code.trim().to_lowercase();
    }

    pub fn set_target_language(&mut self, code: &str) {
        self.form.target_language = code.trim().to_lowercase();
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// Fetches the language list once; a failure leaves it empty
    pub async fn load_languages(&mut self) -> &[Language] {
        match self.api.list_languages().await {
            Ok(languages) => {
                debug!("Loaded {} language(s)", languages.len());
                self.languages = languages;
            }
            Err(e) => error!("Failed to load languages: {}", e),
        }
        &self.languages
    }

    /// Submits the selected file
    ///
    /// On success the selection is cleared and the poller is signalled. On
    /// failure the selection is kept.
    pub async fn submit(&mut self) -> Result<TranslationJob> {
        let path = self
            .form
            .file
            .clone()
            .ok_or_else(|| anyhow!("No file selected"))?;

        validate_language_pair(&self.form.source_language, &self.form.target_language)?;
        validate_file_name(&path)?;

        match self.upload(&path).await {
            Ok(job) => {
                info!("Submitted {} as job {}", job.file_name, job.id);
                self.form.file = None;
                if let Some(poller) = &self.poller {
                    poller.jobs_changed().await;
                }
                Ok(job)
            }
            Err(e) => {
                error!("Upload failed: {:#}", e);
                Err(e)
            }
        }
    }

    async fn upload(&self, path: &Path) -> Result<TranslationJob> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;

        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile(file_name).into());
        }

        let document = encode_document(&file_name, &bytes);
        debug!(
            "Encoded {} as {} ({} bytes -> {} chars)",
            file_name,
            document.file_type,
            bytes.len(),
            document.content.len()
        );

        let job = self
            .api
            .submit_translation(SubmitTranslation {
                file_name,
                source_language: self.form.source_language.clone(),
                target_language: self.form.target_language.clone(),
                file_content: document.content,
                file_type: document.file_type,
            })
            .await
            .context("Failed to submit translation")?;

        Ok(job)
    }
}
