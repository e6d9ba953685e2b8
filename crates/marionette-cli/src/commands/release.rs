// Path: crates/marionette-cli/src/commands/release.rs

use super::load_config;
use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use marionette_drivers::remote::auth::DeviceAuthHeaders;
use marionette_drivers::remote::session::{HttpSandboxAllocator, SandboxAllocator};
use marionette_drivers::ResourceKind;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Resource {
    Computer,
    Browser,
}

impl From<Resource> for ResourceKind {
    fn from(r: Resource) -> Self {
        match r {
            Resource::Computer => ResourceKind::Computer,
            Resource::Browser => ResourceKind::Browser,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ReleaseArgs {
    /// Operator config (TOML) with a [sandbox] section.
    #[clap(long)]
    pub config: PathBuf,

    /// The leased instance to release.
    #[clap(long)]
    pub instance_id: String,

    #[clap(long, value_enum, default_value = "computer")]
    pub resource: Resource,
}

pub async fn run(args: ReleaseArgs) -> Result<()> {
    let config = load_config(Some(&args.config))?;
    let sandbox = config
        .sandbox
        .as_ref()
        .ok_or_else(|| anyhow!("{} has no [sandbox] section", args.config.display()))?;

    let auth = Arc::new(DeviceAuthHeaders::from_config(sandbox)?);
    let allocator = HttpSandboxAllocator::new(sandbox, auth)?;
    allocator
        .release(args.resource.into(), &args.instance_id)
        .await?;

    println!("Released {} ({})", args.instance_id, ResourceKind::from(args.resource));
    Ok(())
}
