//! Interactive dashboard
//!
//! Shows the job list as the poller updates it and reads one command per
//! line from stdin. The poller, the upload form and the download handoff all
//! share the session's identity; signing out stops all of them.

use anyhow::{Result, bail};
use colored::*;
use std::ops::ControlFlow;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::CommandContext;
use crate::id_resolver::resolve_job;
use crate::render::{needs_redraw, print_form, print_job_details, print_languages, print_snapshot};
use crate::scheduler::{JobListSnapshot, JobStatusPoller, PollerHandle};
use crate::service::{DownloadService, UploadSubmitter};

/// One line of dashboard input
#[derive(Debug, Clone, PartialEq, Eq)]
enum DashboardCommand {
    Refresh,
    File(PathBuf),
    From(String),
    To(String),
    Upload,
    Download(String),
    Show(String),
    Languages,
    Logout,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Option<DashboardCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let argument = |name: &str| -> Result<String> {
        if rest.is_empty() {
            bail!("Usage: {} <{}>", word, name);
        }
        Ok(rest.to_string())
    };

    let command = match word.to_lowercase().as_str() {
        "refresh" | "r" => DashboardCommand::Refresh,
        "file" => DashboardCommand::File(PathBuf::from(argument("path")?)),
        "from" => DashboardCommand::From(argument("language")?),
        "to" => DashboardCommand::To(argument("language")?),
        "upload" | "u" => DashboardCommand::Upload,
        "download" | "d" => DashboardCommand::Download(argument("id")?),
        "show" => DashboardCommand::Show(argument("id")?),
        "languages" => DashboardCommand::Languages,
        "logout" => DashboardCommand::Logout,
        "help" | "?" => DashboardCommand::Help,
        "quit" | "exit" | "q" => DashboardCommand::Quit,
        other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
    };

    Ok(Some(command))
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  refresh            Reload the job list now");
    println!("  file <path>        Select a document to translate");
    println!("  from <code>        Set the source language");
    println!("  to <code>          Set the target language");
    println!("  upload             Submit the selected document");
    println!("  show <id>          Show job details");
    println!("  download <id>      Save a completed translation");
    println!("  languages          List supported languages");
    println!("  logout             Sign out and leave the dashboard");
    println!("  quit               Leave the dashboard");
}

struct Dashboard<'a> {
    ctx: &'a CommandContext,
    poller: PollerHandle,
    submitter: UploadSubmitter,
    downloads: DownloadService,
}

/// Run the dashboard until quit, logout, EOF or Ctrl-C
pub async fn run(ctx: &CommandContext) -> Result<()> {
    let Some(user) = ctx.session.current_user() else {
        bail!("Not signed in. Pass --token or set TRANSDOC_TOKEN.");
    };

    println!(
        "{} {}",
        "Signed in as".dimmed(),
        user.email.cyan()
    );

    let poller = JobStatusPoller::new(ctx.api.clone(), ctx.config.poll_interval, None).spawn();
    let forwarder = poller.follow_identity(ctx.session.subscribe());
    poller.identity_changed(Some(user)).await;

    let mut dashboard = Dashboard {
        ctx,
        submitter: UploadSubmitter::new(ctx.api.clone()).with_poller(poller.clone()),
        downloads: DownloadService::new(ctx.api.clone(), &ctx.config.output_dir),
        poller,
    };
    dashboard.submitter.load_languages().await;
    print_help();

    let result = dashboard.event_loop().await;

    dashboard.poller.shutdown().await;
    forwarder.abort();
    result
}

impl Dashboard<'_> {
    async fn event_loop(&mut self) -> Result<()> {
        let mut snapshots = self.poller.subscribe();
        let mut shown = JobListSnapshot::default();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        bail!("Job status poller stopped unexpectedly");
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if needs_redraw(&shown, &snapshot) {
                        print_snapshot(&snapshot);
                        shown = snapshot;
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("stdin closed, leaving dashboard");
                        return Ok(());
                    };
                    match parse_command(&line) {
                        Ok(Some(command)) => {
                            if self.execute(command).await.is_break() {
                                return Ok(());
                            }
                        }
                        Ok(None) => {}
                        Err(e) => println!("{}", e.to_string().yellow()),
                    }
                }
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
        }
    }

    async fn execute(&mut self, command: DashboardCommand) -> ControlFlow<()> {
        match command {
            DashboardCommand::Refresh => {
                if self.poller.snapshot().is_busy() {
                    println!("{}", "A refresh is already in progress".dimmed());
                } else {
                    self.poller.refresh().await;
                }
            }
            DashboardCommand::File(path) => {
                self.submitter.select_file(path);
                print_form(self.submitter.form());
            }
            DashboardCommand::From(code) => {
                self.submitter.set_source_language(&code);
                print_form(self.submitter.form());
            }
            DashboardCommand::To(code) => {
                self.submitter.set_target_language(&code);
                print_form(self.submitter.form());
            }
            DashboardCommand::Upload => match self.submitter.submit().await {
                Ok(job) => println!(
                    "{} {} ({})",
                    "✓ Submitted".green().bold(),
                    job.file_name,
                    job.language_pair()
                ),
                Err(e) => println!("{} {:#}", "✗ Upload failed:".red().bold(), e),
            },
            DashboardCommand::Download(id) => {
                let snapshot = self.poller.snapshot();
                let saved = match resolve_job(&snapshot.jobs, &id) {
                    Ok(job) => self.downloads.download(job).await,
                    Err(e) => Err(e),
                };
                match saved {
                    Ok(path) => println!("{} {}", "✓ Saved".green().bold(), path.display()),
                    Err(e) => println!("{} {:#}", "✗ Download failed:".red().bold(), e),
                }
            }
            DashboardCommand::Show(id) => {
                let snapshot = self.poller.snapshot();
                match resolve_job(&snapshot.jobs, &id) {
                    Ok(job) => print_job_details(job),
                    Err(e) => println!("{}", e.to_string().yellow()),
                }
            }
            DashboardCommand::Languages => print_languages(self.submitter.languages()),
            DashboardCommand::Logout => {
                if let Err(e) = self.ctx.session.sign_out().await {
                    println!("{} {}", "!".yellow(), e);
                }
                println!("{}", "Signed out".dimmed());
                return ControlFlow::Break(());
            }
            DashboardCommand::Help => print_help(),
            DashboardCommand::Quit => return ControlFlow::Break(()),
        }

        ControlFlow::Continue(())
    }
}
