// Path: crates/marionette-types/src/config/mod.rs

//! Shared configuration structures for operators and the run loop.
//!
//! Every field has a default so that an empty TOML document is a valid local
//! operator configuration.

use crate::app::{BackendKind, Platform};
use crate::error::{OperatorError, RetryClass};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `sandbox.token`.
pub const SANDBOX_TOKEN_ENV: &str = "MARIONETTE_SANDBOX_TOKEN";
/// Environment variable overriding `subscription.token`.
pub const SUBSCRIPTION_TOKEN_ENV: &str = "MARIONETTE_SUBSCRIPTION_TOKEN";

/// Top-level operator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    /// Which operator variant to construct.
    pub backend: BackendKind,
    /// Retry budgets per operation class.
    pub retry: RetryConfig,
    /// Tunables shared by every backend's action dispatch.
    pub actions: ActionConfig,
    /// Local desktop settings.
    pub local: LocalConfig,
    /// Leased cloud sandbox settings; required when `backend = "sandbox"`.
    pub sandbox: Option<SandboxConfig>,
    /// Dedicated VM settings; required when `backend = "subscription"`.
    pub subscription: Option<SubscriptionConfig>,
}

impl OperatorConfig {
    /// Reads and validates a TOML configuration file, then applies token
    /// overrides from the environment.
    pub fn load(path: &Path) -> Result<Self, OperatorError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OperatorError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut cfg = Self::from_toml_str(&raw)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parses a TOML document without touching the environment.
    pub fn from_toml_str(raw: &str) -> Result<Self, OperatorError> {
        toml::from_str(raw).map_err(|e| OperatorError::Config(format!("Invalid config: {}", e)))
    }

    /// Replaces remote tokens with values from the environment when present.
    pub fn apply_env_overrides(&mut self) {
        if let (Some(sandbox), Ok(token)) = (self.sandbox.as_mut(), std::env::var(SANDBOX_TOKEN_ENV))
        {
            sandbox.token = Some(token);
        }
        if let (Some(sub), Ok(token)) = (
            self.subscription.as_mut(),
            std::env::var(SUBSCRIPTION_TOKEN_ENV),
        ) {
            sub.token = Some(token);
        }
    }

    /// Rejects a remote backend whose section is missing or incomplete.
    pub fn validate(&self) -> Result<(), OperatorError> {
        match self.backend {
            BackendKind::Local => {}
            BackendKind::Sandbox => {
                let sandbox = self.sandbox.as_ref().ok_or_else(|| {
                    OperatorError::Config("backend = \"sandbox\" requires a [sandbox] section".into())
                })?;
                if sandbox.base_url.trim().is_empty() {
                    return Err(OperatorError::Config("sandbox.base_url is empty".into()));
                }
                if sandbox.allocation_url.trim().is_empty() {
                    return Err(OperatorError::Config("sandbox.allocation_url is empty".into()));
                }
            }
            BackendKind::Subscription => {
                let sub = self.subscription.as_ref().ok_or_else(|| {
                    OperatorError::Config(
                        "backend = \"subscription\" requires a [subscription] section".into(),
                    )
                })?;
                if sub.instance_url.trim().is_empty() {
                    return Err(OperatorError::Config("subscription.instance_url is empty".into()));
                }
                if sub.token.as_deref().map_or(true, str::is_empty) {
                    return Err(OperatorError::Config(format!(
                        "subscription.token is missing (set it or {})",
                        SUBSCRIPTION_TOKEN_ENV
                    )));
                }
            }
        }
        if self.actions.max_scroll_amount == 0 {
            return Err(OperatorError::Config("actions.max_scroll_amount must be > 0".into()));
        }
        Ok(())
    }
}

/// Maximum attempts for one operation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBudget {
    /// Total attempts before the failure is surfaced. Zero is treated as one.
    pub max_retries: u32,
}

impl RetryBudget {
    /// Creates a budget.
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// The number of attempts the wrapper will actually make.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Retry budgets for the three operation classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Budget for the model inference call.
    pub model: RetryBudget,
    /// Budget for screenshot capture.
    pub screenshot: RetryBudget,
    /// Budget for action execution.
    pub execute: RetryBudget,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            model: RetryBudget::new(5),
            screenshot: RetryBudget::new(5),
            execute: RetryBudget::new(1),
        }
    }
}

impl RetryConfig {
    /// Looks up the budget of one class.
    pub fn budget(&self, class: RetryClass) -> RetryBudget {
        match class {
            RetryClass::Model => self.model,
            RetryClass::Screenshot => self.screenshot,
            RetryClass::Execute => self.execute,
        }
    }
}

/// Tunables applied uniformly by the action dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Duration of the `wait` action.
    pub wait_secs: u64,
    /// Scroll magnitude requested per `scroll` action.
    pub scroll_amount: u32,
    /// Hard ceiling on the scroll magnitude sent to a backend.
    pub max_scroll_amount: u32,
    /// JPEG quality of local screenshots.
    pub jpeg_quality: u8,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            wait_secs: 5,
            scroll_amount: 5,
            max_scroll_amount: 10,
            jpeg_quality: 75,
        }
    }
}

impl ActionConfig {
    /// The scroll magnitude after clamping.
    pub fn effective_scroll_amount(&self) -> u32 {
        self.scroll_amount.clamp(1, self.max_scroll_amount.max(1))
    }
}

/// Local desktop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Force (or forbid) clipboard-paste typing. Defaults to the platform rule.
    pub paste_typing: Option<bool>,
    /// Timeout of the fallback screenshot command.
    pub capture_timeout_secs: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            paste_typing: None,
            capture_timeout_secs: 5,
        }
    }
}

/// Settings of the leased cloud sandbox backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Root URL of the per-verb RPC endpoints (`{base_url}/MoveMouse`, ...).
    pub base_url: String,
    /// Root URL of the allocation service.
    pub allocation_url: String,
    /// Device identifier sent as `X-Device-Id`.
    #[serde(default)]
    pub device_id: String,
    /// Bearer token sent in `Authorization`.
    #[serde(default)]
    pub token: Option<String>,
    /// OS of the leased VM.
    #[serde(default = "default_remote_platform")]
    pub platform: Platform,
    /// Lease length requested from the allocation service.
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Settings of the dedicated subscription VM backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// The instance's RPC URL.
    pub instance_url: String,
    /// Raw value sent in `Authorization`.
    #[serde(default)]
    pub token: Option<String>,
    /// OS of the VM.
    #[serde(default = "default_remote_platform")]
    pub platform: Platform,
    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_remote_platform() -> Platform {
    Platform::Windows
}
fn default_lease_secs() -> u64 {
    1800
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_is_a_local_config() {
        let cfg = OperatorConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.backend, BackendKind::Local);
        assert_eq!(cfg.retry, RetryConfig::default());
        assert_eq!(cfg.actions.wait_secs, 5);
        assert_eq!(cfg.actions.jpeg_quality, 75);
        cfg.validate().unwrap();
    }

    #[test]
    fn sandbox_section_parses_with_defaults() {
        let raw = r#"
            backend = "sandbox"

            [retry.execute]
            max_retries = 3

            [sandbox]
            base_url = "https://sandbox.example.com"
            allocation_url = "https://alloc.example.com"
            device_id = "dev-1"
        "#;
        let cfg = OperatorConfig::from_toml_str(raw).unwrap();
        cfg.validate().unwrap();
        let sandbox = cfg.sandbox.unwrap();
        assert_eq!(sandbox.platform, Platform::Windows);
        assert_eq!(sandbox.lease_secs, 1800);
        assert_eq!(cfg.retry.execute.max_retries, 3);
        assert_eq!(cfg.retry.model.max_retries, 5);
    }

    #[test]
    fn remote_backend_without_section_is_rejected() {
        let cfg = OperatorConfig::from_toml_str("backend = \"subscription\"").unwrap();
        assert!(matches!(cfg.validate(), Err(OperatorError::Config(_))));
    }

    #[test]
    fn scroll_amount_is_clamped() {
        let actions = ActionConfig {
            scroll_amount: 50,
            ..Default::default()
        };
        assert_eq!(actions.effective_scroll_amount(), 10);
        assert_eq!(RetryBudget::new(0).attempts(), 1);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[subscription]\ninstance_url = \"https://vm.example.com\"\ntoken = \"abc\"\nplatform = \"linux\"\n\n[actions]\nwait_secs = 1"
        )
        .unwrap();
        let cfg = OperatorConfig::load(file.path()).unwrap();
        assert_eq!(cfg.actions.wait_secs, 1);
        assert_eq!(cfg.subscription.unwrap().platform, Platform::Linux);
    }
}
