//! Terminal rendering
//!
//! Every status is matched exhaustively so a new status cannot silently fall
//! through to another's icon or color.

use colored::*;
use transdoc_core::domain::job::{JobStatus, TranslationJob};
use transdoc_core::domain::language::Language;

use crate::scheduler::JobListSnapshot;
use crate::service::UploadForm;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Icon shown next to a job
pub fn status_icon(status: JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending => "◷".yellow(),
        JobStatus::Processing => "⟳".blue(),
        JobStatus::Completed => "✓".green(),
        JobStatus::Failed => "✗".red(),
    }
}

/// Colorize job status for display
pub fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Processing => status_str.blue(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
    }
}

/// Print a one-entry job summary
pub fn print_job_summary(job: &TranslationJob) {
    println!(
        "  {} {}  {}",
        status_icon(job.status),
        job.file_name.bold(),
        job.language_pair().dimmed()
    );
    println!("    ID:        {}", job.id.to_string().dimmed());
    println!("    Status:    {}", colorize_status(job.status));
    println!(
        "    Created:   {}",
        job.created_at.format(TIME_FORMAT).to_string().dimmed()
    );
    if let Some(completed) = job.completed_at {
        println!(
            "    Completed: {}",
            completed.format(TIME_FORMAT).to_string().dimmed()
        );
    }
    println!();
}

/// Print detailed job information
pub fn print_job_details(job: &TranslationJob) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  File:        {}", job.file_name);
    println!("  Languages:   {}", job.language_pair());
    println!(
        "  Status:      {} {}",
        status_icon(job.status),
        colorize_status(job.status)
    );
    println!("  Created:     {}", job.created_at.format(TIME_FORMAT));

    if let Some(completed) = job.completed_at {
        println!("  Completed:   {}", completed.format(TIME_FORMAT));

        let duration = completed.signed_duration_since(job.created_at);
        println!("  Duration:    {}s", duration.num_seconds());
    }

    if job.is_downloadable() {
        let source = if job.download_reference.is_some() {
            "pre-authorized link"
        } else {
            "API"
        };
        println!(
            "  Download:    {} (via {})",
            job.download_file_name().cyan(),
            source
        );
    }
}

/// Print a fetched job list
pub fn print_job_list(jobs: &[TranslationJob]) {
    if jobs.is_empty() {
        println!("{}", "No translations yet.".yellow());
        println!("{}", "Upload a document to get started.".dimmed());
        return;
    }

    println!("{}", format!("Found {} translation(s):", jobs.len()).bold());
    println!();
    for job in jobs {
        print_job_summary(job);
    }
}

/// Whether `next` differs from what is on screen in a way worth reprinting
///
/// The lightweight refresh indicator flips on every tick and is ignored.
pub fn needs_redraw(shown: &JobListSnapshot, next: &JobListSnapshot) -> bool {
    shown.jobs != next.jobs
        || shown.loading != next.loading
        || shown.polling != next.polling
        || shown.last_error != next.last_error
}

/// Print the dashboard's job table
pub fn print_snapshot(snapshot: &JobListSnapshot) {
    let mut header = "Translation History".bold().to_string();
    if snapshot.polling {
        header.push_str(&format!("  {}", "● Live updates active".blue()));
    }
    if snapshot.refreshing {
        header.push_str(&format!("  {}", "refreshing…".dimmed()));
    }

    println!();
    println!("{}", header);
    println!("{}", "─".repeat(72).dimmed());

    if snapshot.loading && snapshot.jobs.is_empty() {
        println!("  {}", "Loading…".dimmed());
    } else if snapshot.jobs.is_empty() {
        println!("  {}", "No translations yet".yellow());
        println!("  {}", "Upload a document to get started".dimmed());
    } else {
        for (index, job) in snapshot.jobs.iter().enumerate() {
            print_job_row(index + 1, job);
        }
    }

    if let Some(error) = &snapshot.last_error {
        println!(
            "  {} {}",
            "!".yellow(),
            format!("Last refresh failed: {}", error).dimmed()
        );
    }
    println!("{}", "─".repeat(72).dimmed());
}

fn print_job_row(index: usize, job: &TranslationJob) {
    let short_id: String = job.id.as_str().chars().take(8).collect();
    let download_hint = if job.is_downloadable() {
        "  ⇩".cyan().to_string()
    } else {
        String::new()
    };

    println!(
        "  {:>2}. {} {:<32} {:<10} {:<22} {}{}",
        index,
        status_icon(job.status),
        job.file_name,
        job.language_pair(),
        colorize_status(job.status),
        short_id.dimmed(),
        download_hint
    );
}

/// Print the upload form state
pub fn print_form(form: &UploadForm) {
    let file = form
        .file
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    println!(
        "  File: {}  From: {}  To: {}",
        file.cyan(),
        form.source_language.to_uppercase(),
        form.target_language.to_uppercase()
    );
    if let Some(blocker) = form.blocker() {
        println!("  {}", blocker.to_string().yellow());
    }
}

/// Print available languages
pub fn print_languages(languages: &[Language]) {
    if languages.is_empty() {
        println!("{}", "No languages available.".yellow());
        return;
    }

    for language in languages {
        println!("  {}  {}", language.code.cyan(), language.name);
    }
}
