// Path: crates/marionette-drivers/src/remote/auth.rs

use async_trait::async_trait;
use marionette_api::{AuthHeaderProvider, AuthHeaders};
use marionette_types::config::SandboxConfig;
use marionette_types::error::OperatorError;
use std::time::{SystemTime, UNIX_EPOCH};

/// Builds sandbox headers from a device id and a static bearer token.
///
/// The timestamp is taken fresh on every call.
#[derive(Clone)]
pub struct DeviceAuthHeaders {
    device_id: String,
    token: String,
}

impl std::fmt::Debug for DeviceAuthHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAuthHeaders")
            .field("device_id", &self.device_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl DeviceAuthHeaders {
    pub fn new(device_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &SandboxConfig) -> Result<Self, OperatorError> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OperatorError::Auth("sandbox token is not configured".into()))?;
        Ok(Self::new(config.device_id.clone(), token))
    }
}

#[async_trait]
impl AuthHeaderProvider for DeviceAuthHeaders {
    async fn headers(&self) -> Result<AuthHeaders, OperatorError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| OperatorError::Auth(format!("System clock before epoch: {}", e)))?
            .as_millis();
        Ok(AuthHeaders {
            device_id: self.device_id.clone(),
            timestamp: millis.to_string(),
            authorization: format!("Bearer {}", self.token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn headers_carry_bearer_and_device() {
        let auth = DeviceAuthHeaders::new("dev-7", "tok");
        let headers = auth.headers().await.unwrap();
        assert_eq!(headers.device_id, "dev-7");
        assert_eq!(headers.authorization, "Bearer tok");
        assert!(headers.timestamp.parse::<u128>().unwrap() > 0);
        assert!(!format!("{:?}", auth).contains("tok\""));
    }

    #[test]
    fn missing_token_is_an_auth_error() {
        let config = SandboxConfig {
            base_url: "http://x".into(),
            allocation_url: "http://y".into(),
            device_id: "d".into(),
            token: None,
            platform: marionette_types::app::Platform::Windows,
            lease_secs: 60,
            request_timeout_secs: 5,
        };
        assert!(matches!(
            DeviceAuthHeaders::from_config(&config),
            Err(OperatorError::Auth(_))
        ));
    }
}
