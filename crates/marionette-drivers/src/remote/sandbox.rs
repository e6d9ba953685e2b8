// Path: crates/marionette-drivers/src/remote/sandbox.rs

use super::session::{Lease, ResourceKind, SessionManager};
use super::{build_client, send_rpc, RemoteBackend, RpcTransport};
use crate::dispatch::{execute_plan, ActionDispatcher};
use async_trait::async_trait;
use marionette_api::{AuthHeaderProvider, Operator, ScreenshotProvider};
use marionette_types::app::{
    BackendKind, ExecuteContext, ExecuteOutcome, ParsedAction, ScreenshotOutput,
};
use marionette_types::config::{ActionConfig, SandboxConfig};
use marionette_types::error::OperatorError;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Calls `{base_url}/{Verb}` on one leased instance.
pub struct SandboxClient {
    http: Client,
    base_url: String,
    instance_id: String,
    auth: Arc<dyn AuthHeaderProvider>,
}

impl SandboxClient {
    pub fn new(
        config: &SandboxConfig,
        instance_id: impl Into<String>,
        auth: Arc<dyn AuthHeaderProvider>,
    ) -> Result<Self, OperatorError> {
        Ok(Self {
            http: build_client(config.request_timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            instance_id: instance_id.into(),
            auth,
        })
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

#[async_trait]
impl RpcTransport for SandboxClient {
    fn name(&self) -> &str {
        "sandbox-rpc"
    }

    async fn call(&self, verb: &str, mut fields: Map<String, Value>) -> Result<Value, OperatorError> {
        fields.insert("InstanceId".into(), Value::String(self.instance_id.clone()));
        let headers = self.auth.headers().await?;

        tracing::debug!(target: "rpc", verb, instance_id = %self.instance_id, "Sandbox call");
        let mut request = self
            .http
            .post(format!("{}/{}", self.base_url, verb))
            .json(&fields);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }
        send_rpc(verb, request).await
    }
}

/// Drives a leased cloud VM. The instance id is fixed for the operator's lifetime.
pub struct SandboxOperator {
    remote: RemoteBackend<SandboxClient>,
    dispatcher: ActionDispatcher,
    session: Arc<SessionManager>,
    lease: Lease,
}

impl SandboxOperator {
    /// Acquires a computer lease and binds an operator to it.
    pub async fn connect(
        config: &SandboxConfig,
        actions: ActionConfig,
        session: Arc<SessionManager>,
        auth: Arc<dyn AuthHeaderProvider>,
    ) -> Result<Self, OperatorError> {
        let lease = session.acquire(ResourceKind::Computer).await?;
        let client = SandboxClient::new(config, lease.instance_id.clone(), auth);
        let client = release_on_error(&session, &lease, client).await?;
        let remote = RemoteBackend::new(Arc::new(client), config.platform, BackendKind::Sandbox);
        Ok(Self {
            dispatcher: ActionDispatcher::for_backend(&remote, actions),
            remote,
            session,
            lease,
        })
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }
}

/// Passes `result` through, releasing `lease` first when it is an error.
async fn release_on_error<T>(
    session: &SessionManager,
    lease: &Lease,
    result: Result<T, OperatorError>,
) -> Result<T, OperatorError> {
    if result.is_err() {
        if let Err(e) = session.release(lease.resource).await {
            tracing::warn!(
                target: "session",
                instance_id = %lease.instance_id,
                error = %e,
                "Failed to release lease after setup error"
            );
        }
    }
    result
}

#[async_trait]
impl Operator for SandboxOperator {
    fn backend(&self) -> BackendKind {
        BackendKind::Sandbox
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput, OperatorError> {
        self.remote.capture().await
    }

    async fn execute(
        &self,
        action: &ParsedAction,
        ctx: &ExecuteContext,
    ) -> Result<ExecuteOutcome, OperatorError> {
        if self.lease.is_expired() {
            tracing::warn!(
                target: "session",
                instance_id = %self.lease.instance_id,
                "Executing on an expired lease"
            );
        }
        execute_plan(
            &self.dispatcher,
            &self.remote,
            BackendKind::Sandbox,
            action,
            ctx,
        )
        .await
    }

    async fn teardown(&self) -> Result<(), OperatorError> {
        self.session.release(self.lease.resource).await
    }
}
