//! Download handoff
//!
//! Saves the translated document of a completed job as
//! `translated-<original name>`. A pre-authorized reference is fetched
//! directly; without one the authenticated download endpoint is used.
//! Bytes are staged in a temporary file that is either persisted under the
//! final name or removed, so nothing temporary outlives the download.

use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use transdoc_client::TranslationApi;
use transdoc_core::domain::job::TranslationJob;

pub struct DownloadService {
    api: Arc<dyn TranslationApi>,
    output_dir: PathBuf,
}

impl DownloadService {
    pub fn new(api: Arc<dyn TranslationApi>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
        }
    }

    /// Downloads the translation of `job` and returns where it was saved
    pub async fn download(&self, job: &TranslationJob) -> Result<PathBuf> {
        if !job.is_downloadable() {
            bail!(
                "Job {} is {}; only completed jobs can be downloaded",
                job.id,
                job.status
            );
        }

        let bytes = match &job.download_reference {
            Some(reference) => {
                debug!("Fetching download reference for job {}", job.id);
                self.api
                    .fetch_reference(reference)
                    .await
                    .context("Failed to fetch download reference")?
            }
            None => {
                debug!("No download reference for job {}, using API", job.id);
                self.api
                    .download_translation(&job.id)
                    .await
                    .context("Failed to download translation")?
            }
        };

        let target = self.output_dir.join(job.download_file_name());
        self.save(&target, &bytes)?;

        info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }

    fn save(&self, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut staging = NamedTempFile::new_in(&self.output_dir).with_context(|| {
            format!(
                "Failed to create temporary file in {}",
                self.output_dir.display()
            )
        })?;

        staging
            .write_all(bytes)
            .and_then(|_| staging.flush())
            .context("Failed to write download")?;

        staging
            .persist(target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to save {}", target.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, job};
    use tempfile::TempDir;
    use transdoc_core::domain::job::JobStatus;

    fn leftover_files(dir: &TempDir) -> Vec<String> {
        std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_reference_download_skips_api() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::new());
        let service = DownloadService::new(api.clone(), dir.path());
        let mut completed = job("j1", JobStatus::Completed, 0);
        completed.download_reference = Some("https://bucket.example/j1?sig=x".to_string());

        let path = service.download(&completed).await.unwrap();

        assert_eq!(api.download_calls(), 0);
        assert_eq!(api.reference_calls(), 1);
        assert_eq!(path, dir.path().join("translated-j1.txt"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "referenced body from https://bucket.example/j1?sig=x"
        );
    }

    #[tokio::test]
    async fn test_missing_reference_uses_api_once() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::new());
        let service = DownloadService::new(api.clone(), dir.path());

        let path = service
            .download(&job("j2", JobStatus::Completed, 0))
            .await
            .unwrap();

        assert_eq!(api.download_calls(), 1);
        assert_eq!(api.reference_calls(), 0);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "translated body of j2");
        assert_eq!(leftover_files(&dir), vec!["translated-j2.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_incomplete_job_is_rejected() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::new());
        let service = DownloadService::new(api.clone(), dir.path());

        for status in [JobStatus::Pending, JobStatus::Processing, JobStatus::Failed] {
            assert!(service.download(&job("j3", status, 0)).await.is_err());
        }
        assert_eq!(api.download_calls(), 0);
        assert!(leftover_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_dir_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(FakeApi::new());
        let service = DownloadService::new(api.clone(), dir.path().join("missing"));

        assert!(
            service
                .download(&job("j4", JobStatus::Completed, 0))
                .await
                .is_err()
        );
        assert!(leftover_files(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_nested_file_name_never_overwrites_original() {
        let dir = TempDir::new().unwrap();
        let original = dir.path().join("report.txt");
        std::fs::write(&original, "my own report").unwrap();
        let api = Arc::new(FakeApi::new());
        let service = DownloadService::new(api.clone(), dir.path());
        let mut completed = job("j9", JobStatus::Completed, 0);
        completed.file_name = "docs/report.txt".to_string();

        let path = service.download(&completed).await.unwrap();

        assert_eq!(path, dir.path().join("translated-report.txt"));
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "my own report");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "translated body of j9"
        );
    }
}
