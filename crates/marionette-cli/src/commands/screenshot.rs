// Path: crates/marionette-cli/src/commands/screenshot.rs

use super::load_config;
use anyhow::{Context, Result};
use base64::Engine;
use clap::Parser;
use marionette_drivers::build_operator;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ScreenshotArgs {
    /// Operator config (TOML). Defaults to the local desktop.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Where to write the JPEG.
    #[clap(long, default_value = "screenshot.jpg")]
    pub out: PathBuf,
}

pub async fn run(args: ScreenshotArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let operator = build_operator(&config, None).await?;

    let shot = operator.screenshot().await;
    if let Err(e) = operator.teardown().await {
        tracing::warn!(error = %e, "Teardown failed");
    }
    let shot = shot?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(shot.base64_image.as_bytes())
        .context("Backend returned invalid base64")?;
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("{}", serde_json::to_string_pretty(&shot.geometry)?);
    Ok(())
}
