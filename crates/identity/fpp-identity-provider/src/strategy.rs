use crate::options::FppOptions;
use crate::profile;
use async_trait::async_trait;
use fpp_identity_core::{IdentityProvider, IdentityResult, Profile};
use fpp_identity_oauth2::{
    InMemoryStateStore, OAuth2Result, OAuth2StateStore, OAuth2Strategy, OAuth2StrategyConfig,
    ProfileMapper,
};
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

pub const STRATEGY_NAME: &str = "fpp";
pub const DEFAULT_AUTHORIZATION_URL: &str = "http://auth.osufpp.org/dialog/authorize";
pub const DEFAULT_TOKEN_URL: &str = "http://auth.osufpp.org/oauth/token";
pub const DEFAULT_PROFILE_URL: &str = "http://auth.osufpp.org/api/userinfo";

/// OAuth2 strategy for FPP, registered as `"fpp"`.
///
/// Derefs to the underlying [`OAuth2Strategy`] for `authorization_url`,
/// `handle_callback`, `refresh` and `user_profile`.
#[derive(Clone)]
pub struct FppStrategy {
    inner: OAuth2Strategy,
    profile_fields: Option<Vec<String>>,
}

impl FppStrategy {
    pub fn new(options: FppOptions) -> OAuth2Result<Self> {
        Self::with_state_store(options, Arc::new(InMemoryStateStore::new()))
    }

    pub fn with_state_store(
        options: FppOptions,
        state_store: Arc<dyn OAuth2StateStore>,
    ) -> OAuth2Result<Self> {
        let FppOptions {
            client_id,
            client_secret,
            callback_url,
            authorization_url,
            token_url,
            profile_url,
            profile_fields,
            profile_field_map,
            scope,
            pkce,
        } = options;

        let config = OAuth2StrategyConfig::new(
            STRATEGY_NAME,
            authorization_url.unwrap_or_else(|| DEFAULT_AUTHORIZATION_URL.to_string()),
            token_url.unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            profile_url.unwrap_or_else(|| DEFAULT_PROFILE_URL.to_string()),
        )
        .with_client(client_id, client_secret)
        .with_redirect_uri(callback_url.unwrap_or_default())
        .with_scopes(scope)
        .with_pkce(pkce);

        let mapper: Arc<dyn ProfileMapper> = match profile_field_map {
            Some(map) => Arc::new(map),
            None => Arc::new(profile::parse),
        };

        debug!(
            "Configured {} strategy against {}",
            STRATEGY_NAME, config.authorization_url
        );

        Ok(Self {
            inner: OAuth2Strategy::new(config, mapper, state_store)?,
            profile_fields,
        })
    }

    pub fn profile_fields(&self) -> Option<&[String]> {
        self.profile_fields.as_deref()
    }
}

impl Deref for FppStrategy {
    type Target = OAuth2Strategy;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[async_trait]
impl IdentityProvider for FppStrategy {
    fn provider_id(&self) -> &str {
        self.inner.name()
    }

    async fn verify(&self, auth_payload: serde_json::Value) -> IdentityResult<Profile> {
        self.inner.verify(auth_payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let strategy = FppStrategy::new(FppOptions::new("id", "secret")).unwrap();

        assert_eq!(strategy.name(), "fpp");
        assert_eq!(strategy.provider_id(), "fpp");
        assert_eq!(strategy.config().authorization_url, DEFAULT_AUTHORIZATION_URL);
        assert_eq!(strategy.config().token_url, DEFAULT_TOKEN_URL);
        assert_eq!(strategy.config().profile_url, DEFAULT_PROFILE_URL);
        assert_eq!(strategy.config().client_secret, "secret");
        assert!(strategy.profile_fields().is_none());
    }

    #[test]
    fn test_overrides_apply() {
        let options: FppOptions = serde_json::from_value(serde_json::json!({
            "clientID": "id",
            "authorizationUrl": "https://sso.example/authorize",
            "tokenURL": "https://sso.example/token",
            "profileUrl": "https://sso.example/me",
            "profileFields": ["id"]
        }))
        .unwrap();

        let strategy = FppStrategy::new(options).unwrap();

        assert_eq!(strategy.config().authorization_url, "https://sso.example/authorize");
        assert_eq!(strategy.config().token_url, "https://sso.example/token");
        assert_eq!(strategy.config().profile_url, "https://sso.example/me");
        assert_eq!(strategy.profile_fields(), Some(&["id".to_string()][..]));
    }
}
