// Path: crates/marionette-cli/src/commands/config.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use marionette_types::app::{BackendKind, Platform};
use marionette_types::config::{OperatorConfig, SandboxConfig, SubscriptionConfig};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ConfigCmdArgs {
    #[clap(subcommand)]
    pub command: ConfigSubCommands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    Local,
    Sandbox,
    Subscription,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubCommands {
    /// Generate an operator.toml with every default spelled out.
    New {
        #[clap(long, default_value = "operator.toml")]
        out: PathBuf,
        #[clap(long, value_enum, default_value = "local")]
        backend: Backend,
    },
}

/// A starting config for `backend`. Remote URLs are placeholders.
pub fn template(backend: Backend) -> OperatorConfig {
    let mut cfg = OperatorConfig::default();
    match backend {
        Backend::Local => {}
        Backend::Sandbox => {
            cfg.backend = BackendKind::Sandbox;
            cfg.sandbox = Some(SandboxConfig {
                base_url: "https://sandbox.example.com/api".into(),
                allocation_url: "https://sandbox.example.com/alloc".into(),
                device_id: "my-device".into(),
                token: None,
                platform: Platform::Windows,
                lease_secs: 1800,
                request_timeout_secs: 30,
            });
        }
        Backend::Subscription => {
            cfg.backend = BackendKind::Subscription;
            cfg.subscription = Some(SubscriptionConfig {
                instance_url: "https://vm.example.com/".into(),
                token: None,
                platform: Platform::Windows,
                request_timeout_secs: 30,
            });
        }
    }
    cfg
}

pub fn run(args: ConfigCmdArgs) -> Result<()> {
    match args.command {
        ConfigSubCommands::New { out, backend } => {
            let cfg = template(backend);
            let rendered = toml::to_string_pretty(&cfg).context("Failed to render config")?;
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, rendered)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_config_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/operator.toml");
        run(ConfigCmdArgs {
            command: ConfigSubCommands::New {
                out: out.clone(),
                backend: Backend::Sandbox,
            },
        })
        .unwrap();

        let raw = fs::read_to_string(&out).unwrap();
        let cfg = OperatorConfig::from_toml_str(&raw).unwrap();
        assert_eq!(cfg, template(Backend::Sandbox));
        cfg.validate().unwrap();
    }
}
