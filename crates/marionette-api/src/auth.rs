// Path: crates/marionette-api/src/auth.rs

use async_trait::async_trait;
use marionette_types::error::OperatorError;

/// Header names attached to every sandbox RPC call.
pub const HEADER_DEVICE_ID: &str = "X-Device-Id";
/// Request timestamp header (milliseconds since the Unix epoch).
pub const HEADER_TIMESTAMP: &str = "X-Timestamp";
/// Standard authorization header.
pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// The signed headers produced by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    pub device_id: String,
    pub timestamp: String,
    /// Full header value, including the `Bearer ` scheme.
    pub authorization: String,
}

impl AuthHeaders {
    /// Header (name, value) pairs in a stable order.
    pub fn pairs(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_DEVICE_ID, self.device_id.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_AUTHORIZATION, self.authorization.as_str()),
        ]
    }
}

/// Produces fresh request headers for every remote call.
///
/// Token freshness and signing are entirely the implementor's responsibility;
/// operators call this once per RPC and never cache the result.
#[async_trait]
pub trait AuthHeaderProvider: Send + Sync {
    async fn headers(&self) -> Result<AuthHeaders, OperatorError>;
}
