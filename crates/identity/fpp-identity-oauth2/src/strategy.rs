//! Generic OAuth2 strategy assembled from endpoint configuration and a profile mapper.

use crate::client::OAuth2Client;
use crate::config::OAuth2StrategyConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::mapper::ProfileMapper;
use crate::state::OAuth2StateStore;
use crate::types::{AuthorizationResponse, OAuth2Login, TokenResponse};
use async_trait::async_trait;
use fpp_identity_core::{IdentityError, IdentityProvider, IdentityResult, Profile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Authentication payload accepted by [`OAuth2Strategy::verify`]
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OAuth2AuthPayload {
    /// Complete the flow with the provider's redirect parameters
    Callback {
        code: String,
        state: String,
        error: Option<String>,
        error_description: Option<String>,
    },
    /// Load the profile for an already obtained access token
    AccessToken { access_token: String },
}

#[derive(Clone)]
pub struct OAuth2Strategy {
    config: OAuth2StrategyConfig,
    client: OAuth2Client,
    mapper: Arc<dyn ProfileMapper>,
}

impl OAuth2Strategy {
    pub fn new(
        config: OAuth2StrategyConfig,
        mapper: Arc<dyn ProfileMapper>,
        state_store: Arc<dyn OAuth2StateStore>,
    ) -> OAuth2Result<Self> {
        if config.name.is_empty() {
            return Err(OAuth2Error::ConfigError(
                "Strategy name must not be empty".to_string(),
            ));
        }

        let client = OAuth2Client::new(
            state_store,
            config.state_ttl_seconds,
            config.http_timeout_seconds,
        )?;

        Ok(Self {
            config,
            client,
            mapper,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &OAuth2StrategyConfig {
        &self.config
    }

    pub fn client(&self) -> &OAuth2Client {
        &self.client
    }

    /// Build the URL to redirect the user to; returns `(url, state)`
    pub async fn authorization_url(
        &self,
        additional_params: HashMap<String, String>,
    ) -> OAuth2Result<(String, String)> {
        self.client
            .authorization_url(&self.config, additional_params)
            .await
    }

    pub async fn handle_callback(
        &self,
        callback_response: AuthorizationResponse,
    ) -> OAuth2Result<OAuth2Login> {
        let tokens = self
            .client
            .exchange_callback(&self.config, callback_response)
            .await?;

        let profile = self.user_profile(&tokens.access_token).await?;

        info!("Completed OAuth2 flow for strategy {}", self.name());
        Ok(OAuth2Login { tokens, profile })
    }

    pub async fn refresh(&self, refresh_token: &str) -> OAuth2Result<TokenResponse> {
        self.client.refresh_token(&self.config, refresh_token).await
    }

    /// Fetch the user-info document and normalize it.
    pub async fn user_profile(&self, access_token: &str) -> OAuth2Result<Profile> {
        let body = self
            .client
            .get(&self.config.profile_url, access_token)
            .await
            .map_err(|e| OAuth2Error::internal("Failed to fetch user profile", e))?;

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(OAuth2Error::ProfileParse)?;

        let mut profile = self.mapper.map_profile(&json);
        profile.provider = self.config.name.clone();
        profile.raw = body;
        profile.json = json;

        debug!(
            "Loaded {} profile for subject: {}",
            profile.provider, profile.id
        );
        Ok(profile)
    }
}

#[async_trait]
impl IdentityProvider for OAuth2Strategy {
    fn provider_id(&self) -> &str {
        self.name()
    }

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<Profile> {
        let payload: OAuth2AuthPayload =
            serde_json::from_value(auth_payload).map_err(|_| IdentityError::InvalidPayload)?;

        let result = match payload {
            OAuth2AuthPayload::Callback {
                code,
                state,
                error,
                error_description,
            } => self
                .handle_callback(AuthorizationResponse {
                    code,
                    state,
                    error,
                    error_description,
                })
                .await
                .map(|login| login.profile),
            OAuth2AuthPayload::AccessToken { access_token } => {
                self.user_profile(&access_token).await
            }
        };

        result.map_err(|e| IdentityError::ProviderError(provider_message(&e)))
    }
}

/// Host-facing message; provider failures keep their cause.
fn provider_message(error: &OAuth2Error) -> String {
    match error {
        OAuth2Error::InternalOAuth { message, source } => format!("{}: {}", message, source),
        other => other.to_string(),
    }
}
