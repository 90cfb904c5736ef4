//! Language command handler

use anyhow::{Context, Result};
use colored::*;

use super::CommandContext;
use crate::render::print_languages;

/// List the languages the backend can translate between
pub async fn list_languages(ctx: &CommandContext) -> Result<()> {
    let languages = ctx
        .api
        .list_languages()
        .await
        .context("Failed to fetch languages")?;

    println!(
        "{}",
        format!("{} supported language(s):", languages.len()).bold()
    );
    print_languages(&languages);

    Ok(())
}
