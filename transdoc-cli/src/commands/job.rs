//! Job command handlers
//!
//! Handles all job-related CLI commands: submitting documents, listing and
//! inspecting jobs, downloading results and watching active jobs finish.

use anyhow::{Context, Result, anyhow, bail};
use colored::*;
use std::path::PathBuf;
use tokio::sync::watch;
use transdoc_core::domain::user::User;

use super::CommandContext;
use crate::id_resolver::fetch_job;
use crate::render::{needs_redraw, print_job_details, print_job_list, print_snapshot};
use crate::scheduler::poller::order_jobs;
use crate::scheduler::{JobListSnapshot, JobStatusPoller, PollerHandle};
use crate::service::{DownloadService, UploadSubmitter};

/// Submit a document and optionally follow it to completion
pub async fn submit(
    ctx: &CommandContext,
    file: PathBuf,
    from: &str,
    to: &str,
    watch: bool,
) -> Result<()> {
    require_user(ctx)?;

    let mut submitter = UploadSubmitter::new(ctx.api.clone());
    submitter.select_file(file);
    submitter.set_source_language(from);
    submitter.set_target_language(to);

    let job = submitter.submit().await?;

    println!("{}", "✓ Translation submitted".green().bold());
    print_job_details(&job);

    if watch {
        println!();
        watch_jobs(ctx).await?;
    }

    Ok(())
}

/// List all jobs, newest first
pub async fn list_jobs(ctx: &CommandContext) -> Result<()> {
    require_user(ctx)?;

    let fetched = ctx
        .api
        .list_translations()
        .await
        .context("Failed to load translations")?;

    print_job_list(&order_jobs(&[], fetched));

    Ok(())
}

/// Get and display a single job
pub async fn get_job(ctx: &CommandContext, id: &str) -> Result<()> {
    require_user(ctx)?;

    let job = fetch_job(ctx.api.as_ref(), id).await?;
    print_job_details(&job);

    Ok(())
}

/// Save a completed job's translation into the output directory
pub async fn download_job(ctx: &CommandContext, id: &str) -> Result<()> {
    require_user(ctx)?;

    let job = fetch_job(ctx.api.as_ref(), id).await?;
    let service = DownloadService::new(ctx.api.clone(), &ctx.config.output_dir);
    let path = service.download(&job).await?;

    println!("{} {}", "✓ Saved".green().bold(), path.display());

    Ok(())
}

/// Follow the job list until nothing is pending or processing
pub async fn watch_jobs(ctx: &CommandContext) -> Result<()> {
    let user = require_user(ctx)?;

    let poller = JobStatusPoller::new(ctx.api.clone(), ctx.config.poll_interval, None).spawn();
    poller.identity_changed(Some(user)).await;

    let result = tokio::select! {
        result = wait_until_idle(&poller) => result,
        _ = tokio::signal::ctrl_c() => {
            println!("{}", "Stopped watching".dimmed());
            Ok(())
        }
    };

    poller.shutdown().await;
    result
}

async fn wait_until_idle(poller: &PollerHandle) -> Result<()> {
    let mut snapshots = poller.subscribe();
    let mut shown = JobListSnapshot::default();

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if needs_redraw(&shown, &snapshot) {
            print_snapshot(&snapshot);
            shown = snapshot.clone();
        }

        if let Some(done) = watch_finished(&snapshot) {
            return done;
        }

        changed(&mut snapshots).await?;
    }
}

/// Whether a watch is over, and how it ended
fn watch_finished(snapshot: &JobListSnapshot) -> Option<Result<()>> {
    if snapshot.completed_refreshes == 0 || snapshot.is_busy() || snapshot.polling {
        return None;
    }

    match &snapshot.last_error {
        Some(error) if snapshot.jobs.is_empty() => {
            Some(Err(anyhow!("Failed to load translations: {}", error)))
        }
        _ => Some(Ok(())),
    }
}

async fn changed(snapshots: &mut watch::Receiver<JobListSnapshot>) -> Result<()> {
    snapshots
        .changed()
        .await
        .map_err(|_| anyhow!("Job status poller stopped unexpectedly"))
}

fn require_user(ctx: &CommandContext) -> Result<User> {
    match ctx.session.current_user() {
        Some(user) => Ok(user),
        None => bail!("Not signed in. Pass --token or set TRANSDOC_TOKEN."),
    }
}
