// Path: crates/marionette-drivers/src/factory.rs

use crate::gui::LocalOperator;
use crate::remote::auth::DeviceAuthHeaders;
use crate::remote::sandbox::SandboxOperator;
use crate::remote::session::{HttpSandboxAllocator, SessionManager};
use crate::remote::subscription::SubscriptionOperator;
use marionette_api::{AuthHeaderProvider, Operator};
use marionette_types::app::BackendKind;
use marionette_types::config::{OperatorConfig, SandboxConfig};
use marionette_types::error::OperatorError;
use std::sync::Arc;

fn sandbox_section(config: &OperatorConfig) -> Result<&SandboxConfig, OperatorError> {
    config
        .sandbox
        .as_ref()
        .ok_or_else(|| OperatorError::Config("missing [sandbox] section".into()))
}

/// Builds the session manager a sandbox operator leases through.
pub fn build_session_manager(config: &OperatorConfig) -> Result<Arc<SessionManager>, OperatorError> {
    let sandbox = sandbox_section(config)?;
    let auth: Arc<dyn AuthHeaderProvider> = Arc::new(DeviceAuthHeaders::from_config(sandbox)?);
    let allocator = HttpSandboxAllocator::new(sandbox, auth)?;
    Ok(Arc::new(SessionManager::new(Arc::new(allocator))))
}

/// Constructs the operator selected by `config.backend`.
///
/// `session` is only consulted for the sandbox backend; when `None`, a new
/// manager is built from the config.
pub async fn build_operator(
    config: &OperatorConfig,
    session: Option<Arc<SessionManager>>,
) -> Result<Box<dyn Operator>, OperatorError> {
    config.validate()?;
    tracing::info!(target: "operator", backend = %config.backend, "Building operator");

    let operator: Box<dyn Operator> = match config.backend {
        BackendKind::Local => Box::new(LocalOperator::new(config)?),
        BackendKind::Sandbox => {
            let sandbox = sandbox_section(config)?;
            let session = match session {
                Some(session) => session,
                None => build_session_manager(config)?,
            };
            let auth: Arc<dyn AuthHeaderProvider> =
                Arc::new(DeviceAuthHeaders::from_config(sandbox)?);
            Box::new(SandboxOperator::connect(sandbox, config.actions, session, auth).await?)
        }
        BackendKind::Subscription => {
            let sub = config
                .subscription
                .as_ref()
                .ok_or_else(|| OperatorError::Config("missing [subscription] section".into()))?;
            Box::new(SubscriptionOperator::new(sub, config.actions)?)
        }
    };
    Ok(operator)
}
