//! ID resolver module
//!
//! Lets users name a job by a short, unambiguous prefix of its id instead of
//! the full opaque id.

use anyhow::{Context, Result, anyhow};
use transdoc_client::TranslationApi;
use transdoc_core::domain::job::TranslationJob;

/// Finds the job named by `id_or_prefix` in `jobs`
///
/// An exact id always wins; otherwise the prefix (case-insensitive) must
/// match exactly one job.
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
pub fn resolve_job<'a>(jobs: &'a [TranslationJob], id_or_prefix: &str) -> Result<&'a TranslationJob> {
    let input = id_or_prefix.trim();
    if input.is_empty() {
        return Err(anyhow!("Job ID cannot be empty"));
    }

    if let Some(job) = jobs.iter().find(|j| j.id.as_str() == input) {
        return Ok(job);
    }

    let prefix = input.to_lowercase();
    let matches: Vec<_> = jobs
        .iter()
        .filter(|j| j.id.as_str().to_lowercase().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("No job found with ID starting with '{}'", input)),
        1 => Ok(matches[0]),
        _ => {
            let ids: Vec<String> = matches.iter().map(|j| j.id.to_string()).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                input,
                ids.join(", ")
            ))
        }
    }
}

/// Resolves a job ID or prefix against the backend's current job list
pub async fn fetch_job(api: &dyn TranslationApi, id_or_prefix: &str) -> Result<TranslationJob> {
    let jobs = api
        .list_translations()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    let job = resolve_job(&jobs, id_or_prefix)?;

    // The list may be a summary view; the detail endpoint is authoritative.
    match api.get_translation(&job.id).await {
        Ok(detail) => Ok(detail),
        Err(e) if e.is_not_found() => Err(anyhow!("Job {} no longer exists", job.id)),
        Err(e) => Err(e).context("Failed to fetch job details"),
    }
}
