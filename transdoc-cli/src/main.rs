//! Transdoc CLI
//!
//! Command-line dashboard for submitting documents to the translation API and
//! following their jobs until the translations are ready.

mod commands;
mod config;
mod id_resolver;
mod render;
mod scheduler;
mod service;
mod session;
#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "transdoc")]
#[command(about = "Document translation dashboard", long_about = None)]
struct Cli {
    /// Translation API base URL
    #[arg(long, env = "TRANSDOC_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Bearer token (ID token) of the signed-in user
    #[arg(long, env = "TRANSDOC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Email of the signed-in user, when the token carries no claims
    #[arg(long, env = "TRANSDOC_USER")]
    user: Option<String>,

    /// Seconds between refreshes while jobs are active
    #[arg(long, env = "TRANSDOC_POLL_INTERVAL", default_value_t = 3)]
    poll_interval: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "TRANSDOC_HTTP_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Directory translated documents are saved to
    #[arg(long, env = "TRANSDOC_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transdoc_cli=info,transdoc_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
        user: cli.user,
        poll_interval: Duration::from_secs(cli.poll_interval),
        http_timeout: Duration::from_secs(cli.timeout),
        output_dir: cli.output_dir,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
