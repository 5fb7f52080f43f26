//! Core strategy traits and the normalized profile type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid authentication payload")]
    InvalidPayload,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Provider-independent user record produced by a strategy.
///
/// Serializes with the conventional field names `displayName`, `_raw` and
/// `_json` so existing consumers of normalized profiles can read it as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Name of the strategy that produced this profile.
    pub provider: String,
    pub id: String,
    pub username: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Response body exactly as received from the user-info endpoint.
    #[serde(rename = "_raw")]
    pub raw: String,
    /// Parsed user-info payload.
    #[serde(rename = "_json")]
    pub json: serde_json::Value,
}

/// A pluggable authentication method, registered under a unique name.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<Profile>;
}

/// Name-keyed set of strategies a host application authenticates against.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    providers: Arc<RwLock<HashMap<String, Arc<dyn IdentityProvider>>>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy under its `provider_id`, replacing any previous one.
    pub async fn register(&self, provider: Arc<dyn IdentityProvider>) {
        let name = provider.provider_id().to_string();
        debug!("Registering strategy {}", name);
        self.providers.write().await.insert(name, provider);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn authenticate(
        &self,
        name: &str,
        auth_payload: serde_json::Value,
    ) -> IdentityResult<Profile> {
        let provider = self
            .get(name)
            .await
            .ok_or_else(|| IdentityError::ProviderNotFound(name.to_string()))?;

        provider.verify(auth_payload).await
    }
}
