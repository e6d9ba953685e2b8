// Path: crates/marionette-drivers/src/remote/subscription.rs

use super::{build_client, send_rpc, RemoteBackend, RpcTransport};
use crate::dispatch::{execute_plan, ActionDispatcher};
use async_trait::async_trait;
use marionette_api::auth::HEADER_AUTHORIZATION;
use marionette_api::{Operator, ScreenshotProvider};
use marionette_types::app::{
    BackendKind, ExecuteContext, ExecuteOutcome, ParsedAction, ScreenshotOutput,
};
use marionette_types::config::{ActionConfig, SubscriptionConfig};
use marionette_types::error::OperatorError;
use reqwest::Client;
use serde_json::{Map, Value};
use std::sync::Arc;

/// API version sent in every subscription envelope.
pub const API_VERSION: &str = "2020-04-01";

/// Posts `{Action, Version, ...}` envelopes to a dedicated instance URL.
pub struct SubscriptionClient {
    http: Client,
    instance_url: String,
    token: String,
}

impl SubscriptionClient {
    pub fn new(config: &SubscriptionConfig) -> Result<Self, OperatorError> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OperatorError::Auth("subscription token is not configured".into()))?;
        Ok(Self {
            http: build_client(config.request_timeout_secs)?,
            instance_url: config.instance_url.clone(),
            token,
        })
    }
}

#[async_trait]
impl RpcTransport for SubscriptionClient {
    fn name(&self) -> &str {
        "subscription-rpc"
    }

    async fn call(&self, verb: &str, mut fields: Map<String, Value>) -> Result<Value, OperatorError> {
        fields.insert("Action".into(), Value::String(verb.to_string()));
        fields.insert("Version".into(), Value::String(API_VERSION.to_string()));

        tracing::debug!(target: "rpc", verb, "Subscription call");
        let request = self
            .http
            .post(&self.instance_url)
            .header(HEADER_AUTHORIZATION, &self.token)
            .json(&fields);
        send_rpc(verb, request).await
    }
}

/// Drives a pre-provisioned VM addressed by its instance URL.
pub struct SubscriptionOperator {
    remote: RemoteBackend<SubscriptionClient>,
    dispatcher: ActionDispatcher,
}

impl SubscriptionOperator {
    pub fn new(config: &SubscriptionConfig, actions: ActionConfig) -> Result<Self, OperatorError> {
        let client = SubscriptionClient::new(config)?;
        let remote = RemoteBackend::new(
            Arc::new(client),
            config.platform,
            BackendKind::Subscription,
        );
        Ok(Self {
            dispatcher: ActionDispatcher::for_backend(&remote, actions),
            remote,
        })
    }
}

#[async_trait]
impl Operator for SubscriptionOperator {
    fn backend(&self) -> BackendKind {
        BackendKind::Subscription
    }

    async fn screenshot(&self) -> Result<ScreenshotOutput, OperatorError> {
        self.remote.capture().await
    }

    async fn execute(
        &self,
        action: &ParsedAction,
        ctx: &ExecuteContext,
    ) -> Result<ExecuteOutcome, OperatorError> {
        execute_plan(
            &self.dispatcher,
            &self.remote,
            BackendKind::Subscription,
            action,
            ctx,
        )
        .await
    }
}
