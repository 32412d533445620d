//! Secret Resolver - access to per-user identity material
//!
//! The resolver is an external collaborator: given a logical key it returns
//! a secret string or fails. The production implementation reads SSM
//! Parameter Store with decryption enabled; no retry is performed here, a
//! failed lookup fails the whole invocation.

use async_trait::async_trait;
use tracing::debug;

use crate::types::{Result, WicketError};

/// Resolves logical keys to secret values.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Fetch one secret. Fails on missing or inaccessible keys.
    async fn get_secret(&self, key: &str) -> Result<String>;
}

/// SSM Parameter Store backed resolver.
pub struct SsmResolver {
    client: aws_sdk_ssm::Client,
}

impl SsmResolver {
    /// Build a resolver from the ambient AWS environment (region,
    /// credentials chain) the way the platform provides it.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: aws_sdk_ssm::Client::new(&config),
        }
    }

    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretResolver for SsmResolver {
    async fn get_secret(&self, key: &str) -> Result<String> {
        debug!(key = %key, "Fetching secret from parameter store");

        let output = self
            .client
            .get_parameter()
            .name(key)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| WicketError::Secret(format!("lookup of \"{key}\" failed: {e}")))?;

        let value = output
            .parameter()
            .and_then(|p| p.value())
            .ok_or_else(|| WicketError::Secret(format!("\"{key}\" has no value")))?;

        Ok(value.to_string())
    }
}
