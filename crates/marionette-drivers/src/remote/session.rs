// Path: crates/marionette-drivers/src/remote/session.rs

//! Lease bookkeeping for allocated sandbox resources.
//!
//! A `SessionManager` is created once per process and handed by `Arc` to the
//! operators that need a lease. It holds at most one lease per resource kind.

use super::{build_client, send_rpc};
use async_trait::async_trait;
use marionette_api::AuthHeaderProvider;
use marionette_types::config::SandboxConfig;
use marionette_types::error::OperatorError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// The kinds of resource the allocation service leases out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Computer,
    Browser,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Computer => "computer",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the allocation service hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub instance_id: String,
    pub lease: Duration,
}

/// An active lease on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub resource: ResourceKind,
    pub instance_id: String,
    pub expires_at: Instant,
}

impl Lease {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// The allocation service.
#[async_trait]
pub trait SandboxAllocator: Send + Sync {
    async fn allocate(&self, resource: ResourceKind) -> Result<Allocation, OperatorError>;

    async fn release(&self, resource: ResourceKind, instance_id: &str) -> Result<(), OperatorError>;
}

/// Holds at most one lease per `ResourceKind`.
pub struct SessionManager {
    allocator: Arc<dyn SandboxAllocator>,
    leases: Mutex<HashMap<ResourceKind, Lease>>,
}

impl SessionManager {
    pub fn new(allocator: Arc<dyn SandboxAllocator>) -> Self {
        Self {
            allocator,
            leases: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current lease for `resource`, allocating a new one when
    /// there is none or the previous one has expired.
    pub async fn acquire(&self, resource: ResourceKind) -> Result<Lease, OperatorError> {
        let mut leases = self.leases.lock().await;
        if let Some(lease) = leases.get(&resource) {
            if !lease.is_expired() {
                tracing::debug!(target: "session", %resource, instance_id = %lease.instance_id, "Reusing lease");
                return Ok(lease.clone());
            }
            tracing::info!(target: "session", %resource, instance_id = %lease.instance_id, "Lease expired");
            leases.remove(&resource);
        }

        let allocation = self.allocator.allocate(resource).await.map_err(|e| match e {
            OperatorError::Allocation(_) => e,
            other => OperatorError::Allocation(other.to_string()),
        })?;
        let lease = Lease {
            resource,
            instance_id: allocation.instance_id,
            expires_at: Instant::now() + allocation.lease,
        };
        tracing::info!(
            target: "session",
            %resource,
            instance_id = %lease.instance_id,
            lease_secs = allocation.lease.as_secs(),
            "Allocated resource"
        );
        leases.insert(resource, lease.clone());
        Ok(lease)
    }

    /// Releases the lease for `resource`, if any. The lease is forgotten even
    /// when the release call fails; the service reclaims it on expiry.
    pub async fn release(&self, resource: ResourceKind) -> Result<(), OperatorError> {
        let Some(lease) = self.leases.lock().await.remove(&resource) else {
            return Ok(());
        };
        tracing::info!(target: "session", %resource, instance_id = %lease.instance_id, "Releasing resource");
        self.allocator.release(resource, &lease.instance_id).await
    }

    /// Releases every held lease, returning the first failure.
    pub async fn release_all(&self) -> Result<(), OperatorError> {
        let held: Vec<Lease> = self.leases.lock().await.drain().map(|(_, l)| l).collect();
        let mut first_err = None;
        for lease in held {
            if let Err(e) = self.allocator.release(lease.resource, &lease.instance_id).await {
                tracing::warn!(target: "session", resource = %lease.resource, error = %e, "Release failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub async fn current(&self, resource: ResourceKind) -> Option<Lease> {
        self.leases
            .lock()
            .await
            .get(&resource)
            .filter(|l| !l.is_expired())
            .cloned()
    }
}

pub const VERB_ALLOCATE_RESOURCE: &str = "AllocateResource";
pub const VERB_RELEASE_RESOURCE: &str = "ReleaseResource";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AllocateResult {
    instance_id: String,
    #[serde(default)]
    lease_seconds: Option<u64>,
}

/// Talks to the allocation service over the same envelope as the VM verbs.
pub struct HttpSandboxAllocator {
    http: Client,
    allocation_url: String,
    auth: Arc<dyn AuthHeaderProvider>,
    lease_secs: u64,
}

impl HttpSandboxAllocator {
    pub fn new(config: &SandboxConfig, auth: Arc<dyn AuthHeaderProvider>) -> Result<Self, OperatorError> {
        Ok(Self {
            http: build_client(config.request_timeout_secs)?,
            allocation_url: config.allocation_url.trim_end_matches('/').to_string(),
            auth,
            lease_secs: config.lease_secs,
        })
    }

    async fn post(&self, verb: &str, body: serde_json::Value) -> Result<serde_json::Value, OperatorError> {
        let headers = self.auth.headers().await?;
        let mut request = self
            .http
            .post(format!("{}/{}", self.allocation_url, verb))
            .json(&body);
        for (name, value) in headers.pairs() {
            request = request.header(name, value);
        }
        send_rpc(verb, request).await
    }
}

#[async_trait]
impl SandboxAllocator for HttpSandboxAllocator {
    async fn allocate(&self, resource: ResourceKind) -> Result<Allocation, OperatorError> {
        let result = self
            .post(
                VERB_ALLOCATE_RESOURCE,
                json!({ "ResourceType": resource.as_str(), "LeaseSeconds": self.lease_secs }),
            )
            .await
            .map_err(|e| OperatorError::Allocation(e.to_string()))?;
        let allocated: AllocateResult = serde_json::from_value(result)
            .map_err(|e| OperatorError::Allocation(format!("Malformed allocation result: {}", e)))?;
        Ok(Allocation {
            instance_id: allocated.instance_id,
            lease: Duration::from_secs(allocated.lease_seconds.unwrap_or(self.lease_secs)),
        })
    }

    async fn release(&self, resource: ResourceKind, instance_id: &str) -> Result<(), OperatorError> {
        self.post(
            VERB_RELEASE_RESOURCE,
            json!({ "ResourceType": resource.as_str(), "InstanceId": instance_id }),
        )
        .await?;
        Ok(())
    }
}
