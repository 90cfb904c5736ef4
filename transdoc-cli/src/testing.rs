//! In-memory backend used by the unit tests

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use transdoc_client::{ClientError, Result, TranslationApi};
use transdoc_core::domain::job::{JobId, JobStatus, TranslationJob};
use transdoc_core::domain::language::Language;
use transdoc_core::domain::user::User;
use transdoc_core::dto::translation::SubmitTranslation;

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: id.to_string(),
    }
}

/// Job created `minute` minutes after a fixed epoch
pub fn job(id: &str, status: JobStatus, minute: i64) -> TranslationJob {
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
        + ChronoDuration::minutes(minute);
    TranslationJob {
        id: JobId::new(id),
        owner: "user-1".to_string(),
        file_name: format!("{}.txt", id),
        source_language: "en".to_string(),
        target_language: "es".to_string(),
        status,
        created_at,
        completed_at: status
            .is_terminal()
            .then(|| created_at + ChronoDuration::seconds(30)),
        download_reference: None,
        original_text: None,
        translated_text: None,
        s3_input_key: None,
        s3_output_key: None,
    }
}

/// Scripted backend
///
/// `list_translations` pops scripted results in order; once the script is
/// exhausted it keeps returning the last successful list.
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<VecDeque<Result<Vec<TranslationJob>>>>,
    last_jobs: Mutex<Vec<TranslationJob>>,
    list_delay: Mutex<Duration>,
    submit_failures: AtomicUsize,
    panic_next_list: AtomicBool,
    pub submitted: Mutex<Vec<SubmitTranslation>>,
    pub list_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    pub reference_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_jobs(&self, jobs: Vec<TranslationJob>) -> &Self {
        self.script.lock().unwrap().push_back(Ok(jobs));
        self
    }

    pub fn push_error(&self, status: u16) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ClientError::api_error(status, "scripted failure")));
        self
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    /// Makes the next `list_translations` call panic instead of answering
    pub fn panic_next_list(&self) {
        self.panic_next_list.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_submits(&self, count: usize) {
        self.submit_failures.store(count, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn reference_calls(&self) -> usize {
        self.reference_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationApi for FakeApi {
    async fn list_languages(&self) -> Result<Vec<Language>> {
        Ok(vec![
            Language {
                code: "en".to_string(),
                name: "English".to_string(),
            },
            Language {
                code: "es".to_string(),
                name: "Spanish".to_string(),
            },
        ])
    }

    async fn submit_translation(&self, req: SubmitTranslation) -> Result<TranslationJob> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.submit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.submit_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::api_error(500, "Failed to create translation"));
        }

        let mut created = job("created", JobStatus::Pending, 60);
        created.file_name = req.file_name.clone();
        created.source_language = req.source_language.clone();
        created.target_language = req.target_language.clone();
        self.submitted.lock().unwrap().push(req);
        Ok(created)
    }

    async fn list_translations(&self) -> Result<Vec<TranslationJob>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_next_list.swap(false, Ordering::SeqCst) {
            panic!("scripted list failure");
        }

        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(jobs)) => {
                *self.last_jobs.lock().unwrap() = jobs.clone();
                Ok(jobs)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_jobs.lock().unwrap().clone()),
        }
    }

    async fn get_translation(&self, job_id: &JobId) -> Result<TranslationJob> {
        self.last_jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| &job.id == job_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(job_id.to_string()))
    }

    async fn download_translation(&self, job_id: &JobId) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("translated body of {}", job_id).into_bytes())
    }

    async fn fetch_reference(&self, reference: &str) -> Result<Vec<u8>> {
        self.reference_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("referenced body from {}", reference).into_bytes())
    }
}
