// Path: crates/marionette-cli/src/commands/exec.rs

use super::load_config;
use anyhow::{Context, Result};
use clap::Parser;
use marionette_api::Operator;
use marionette_drivers::build_operator;
use marionette_types::app::{ExecuteOutcome, ParsedAction};
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Operator config (TOML). Defaults to the local desktop.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The action as JSON, e.g.
    /// '{"action_type":"click","action_inputs":{"start_box":"[0.5,0.5]"}}'.
    #[clap(long)]
    pub action: String,
}

pub fn parse_action(raw: &str) -> Result<ParsedAction> {
    serde_json::from_str(raw).context("Action is not a valid ParsedAction JSON object")
}

async fn execute(operator: &dyn Operator, action: &ParsedAction) -> Result<ExecuteOutcome> {
    let shot = operator.screenshot().await?;
    let ctx = shot.geometry.context();
    tracing::info!(
        width = ctx.screen_width,
        height = ctx.screen_height,
        scale = ctx.scale_factor,
        "Executing against fresh geometry"
    );
    Ok(operator.execute(action, &ctx).await?)
}

pub async fn run(args: ExecArgs) -> Result<()> {
    let action = parse_action(&args.action)?;
    let config = load_config(args.config.as_deref())?;
    let operator = build_operator(&config, None).await?;

    let outcome = execute(operator.as_ref(), &action).await;
    if let Err(e) = operator.teardown().await {
        tracing::warn!(error = %e, "Teardown failed");
    }

    println!("{}", serde_json::to_string(&outcome?)?);
    Ok(())
}
