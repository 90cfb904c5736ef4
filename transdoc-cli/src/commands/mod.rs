//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod dashboard;
mod job;
mod language;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;
use transdoc_client::TranslationApi;

use crate::config::Config;
use crate::session::SessionContext;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List supported languages
    Languages,
    /// Submit a document for translation
    Submit {
        /// Document to translate (.txt, .doc, .docx or .pdf)
        file: PathBuf,

        /// Source language code
        #[arg(long, default_value = "en")]
        from: String,

        /// Target language code
        #[arg(long, default_value = "es")]
        to: String,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },
    /// List translation jobs, newest first
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Download a completed translation
    Download {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Poll until no job is pending or processing
    Watch,
    /// Interactive dashboard
    Dashboard,
}

/// Everything a command needs to talk to the backend as the current user
pub struct CommandContext {
    pub config: Config,
    pub session: SessionContext,
    pub api: Arc<dyn TranslationApi>,
}

impl CommandContext {
    async fn connect(config: &Config) -> Result<Self> {
        let identity = config.identity();
        let api: Arc<dyn TranslationApi> = Arc::new(config.client(identity.clone())?);
        let session = SessionContext::new(identity);
        session.initialize().await;

        Ok(Self {
            config: config.clone(),
            session,
            api,
        })
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let ctx = CommandContext::connect(config).await?;

    match command {
        Commands::Languages => language::list_languages(&ctx).await,
        Commands::Submit {
            file,
            from,
            to,
            watch,
        } => job::submit(&ctx, file, &from, &to, watch).await,
        Commands::List => job::list_jobs(&ctx).await,
        Commands::Get { id } => job::get_job(&ctx, &id).await,
        Commands::Download { id } => job::download_job(&ctx, &id).await,
        Commands::Watch => job::watch_jobs(&ctx).await,
        Commands::Dashboard => dashboard::run(&ctx).await,
    }
}
