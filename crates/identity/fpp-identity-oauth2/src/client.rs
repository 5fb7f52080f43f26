//! HTTP side of the authorization-code flow.

use crate::config::OAuth2StrategyConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::state::{OAuth2State, OAuth2StateStore, state_ttl};
use crate::types::{AuthorizationResponse, TokenResponse};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::TimeDelta;
use rand::{Rng, thread_rng};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// RFC 7636 verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub const METHOD: &'static str = "S256";

    /// 32 random bytes, which encode to a 43 character verifier.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        thread_rng().fill(&mut seed);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(seed))
    }

    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

#[derive(Clone)]
pub struct OAuth2Client {
    http: Client,
    state_store: Arc<dyn OAuth2StateStore>,
    state_ttl: TimeDelta,
}

impl OAuth2Client {
    /// Fails with `ConfigError` when `state_ttl_seconds` cannot be represented as an expiry.
    pub fn new(
        state_store: Arc<dyn OAuth2StateStore>,
        state_ttl_seconds: u64,
        http_timeout_seconds: u64,
    ) -> OAuth2Result<Self> {
        let state_ttl = state_ttl(state_ttl_seconds)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            state_store,
            state_ttl,
        })
    }

    pub fn state_store(&self) -> &Arc<dyn OAuth2StateStore> {
        &self.state_store
    }

    /// Issue a state for `config.name` and build the provider redirect; returns `(url, state)`.
    pub async fn authorization_url(
        &self,
        config: &OAuth2StrategyConfig,
        additional_params: HashMap<String, String>,
    ) -> OAuth2Result<(String, String)> {
        let mut url = Url::parse(&config.authorization_url)?;
        let pkce = config.use_pkce.then(PkceChallenge::generate);

        let issued = OAuth2State::issue(
            &config.name,
            &config.redirect_uri,
            pkce.as_ref().map(|p| p.verifier.clone()),
            self.state_ttl,
        )?;
        let state = issued.state.clone();
        let scope = config.scopes.join(" ");

        let mut query = vec![
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
        ];
        if !config.redirect_uri.is_empty() {
            query.push(("redirect_uri", config.redirect_uri.as_str()));
        }
        query.push(("state", state.as_str()));
        if !scope.is_empty() {
            query.push(("scope", scope.as_str()));
        }
        if let Some(pkce) = &pkce {
            query.push(("code_challenge", pkce.challenge.as_str()));
            query.push(("code_challenge_method", PkceChallenge::METHOD));
        }
        query.extend(
            config
                .auth_params
                .iter()
                .chain(&additional_params)
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        url.query_pairs_mut().extend_pairs(query);

        self.state_store.store(issued).await?;
        debug!("Issued authorization request for strategy {}", config.name);

        Ok((String::from(url), state))
    }

    /// Redeem the callback's state and trade its code for tokens.
    pub async fn exchange_callback(
        &self,
        config: &OAuth2StrategyConfig,
        callback: AuthorizationResponse,
    ) -> OAuth2Result<TokenResponse> {
        let pending = self.state_store.take(&callback.state, &config.name).await?;

        if let Some(error) = callback.error {
            let description = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!("{}: {}", error, description)));
        }

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", callback.code.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];
        if !pending.redirect_uri.is_empty() {
            form.push(("redirect_uri", pending.redirect_uri.as_str()));
        }
        if let Some(verifier) = pending.code_verifier.as_deref() {
            form.push(("code_verifier", verifier));
        }

        let tokens = self.request_tokens(config, &form).await?;
        info!("Exchanged authorization code for strategy {}", config.name);
        Ok(tokens)
    }

    /// Obtain a fresh access token with the refresh-token grant
    pub async fn refresh_token(
        &self,
        config: &OAuth2StrategyConfig,
        refresh_token: &str,
    ) -> OAuth2Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        let tokens = self.request_tokens(config, &form).await?;
        info!("Refreshed access token for strategy {}", config.name);
        Ok(tokens)
    }

    async fn request_tokens(
        &self,
        config: &OAuth2StrategyConfig,
        form: &[(&str, &str)],
    ) -> OAuth2Result<TokenResponse> {
        let response = self.http.post(&config.token_url).form(form).send().await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token request to {} failed: {}", config.token_url, body);
            return Err(OAuth2Error::TokenExchangeFailed(body));
        }

        response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))
    }

    /// GET `url` with a bearer token and return the body exactly as sent.
    ///
    /// The bytes are decoded as UTF-8 whatever charset the response declares.
    /// A byte-order mark is kept, and a body that is not UTF-8 fails with
    /// `InvalidEncoding`.
    pub async fn get(&self, url: &str, access_token: &str) -> OAuth2Result<String> {
        let response = self.http.get(url).bearer_auth(access_token).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            error!("Request to {} failed with {}: {}", url, status, body);
            return Err(OAuth2Error::UserInfoFailed(format!("{}: {}", status, body)));
        }

        String::from_utf8(bytes.to_vec()).map_err(OAuth2Error::InvalidEncoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InMemoryStateStore;

    fn test_config() -> OAuth2StrategyConfig {
        OAuth2StrategyConfig::new(
            "test_strategy",
            "https://example.com/auth",
            "https://example.com/token",
            "https://example.com/userinfo",
        )
        .with_client("test_client_id", "test_secret")
        .with_redirect_uri("http://localhost:3000/callback")
        .with_scopes(vec!["profile".to_string(), "email".to_string()])
        .with_pkce(true)
    }

    fn test_client() -> OAuth2Client {
        OAuth2Client::new(Arc::new(InMemoryStateStore::new()), 600, 30).unwrap()
    }

    async fn store_state(client: &OAuth2Client, strategy: &str) -> String {
        let issued = OAuth2State::issue(
            strategy,
            "http://localhost:3000/callback",
            None,
            TimeDelta::minutes(10),
        )
        .unwrap();
        let key = issued.state.clone();
        client.state_store().store(issued).await.unwrap();
        key
    }

    #[test]
    fn test_pkce_rfc7636_vector() {
        let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mJ92K9ySEYZHmdLG3bnMj4nQsxcKTM");
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_generated_pkce_is_random_and_in_bounds() {
        let a = PkceChallenge::generate();
        let b = PkceChallenge::generate();

        assert_ne!(a.verifier, b.verifier);
        assert_eq!(a.challenge, PkceChallenge::from_verifier(a.verifier.clone()).challenge);
        assert!((43..=128).contains(&a.verifier.len()));
    }

    #[test]
    fn test_unrepresentable_state_ttl_is_rejected() {
        let result = OAuth2Client::new(Arc::new(InMemoryStateStore::new()), u64::MAX, 30);
        assert!(matches!(result, Err(OAuth2Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_authorization_url_generation() {
        let client = test_client();

        let (auth_url, state) = client
            .authorization_url(&test_config(), HashMap::new())
            .await
            .unwrap();

        let url = Url::parse(&auth_url).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/auth");

        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "test_client_id");
        assert_eq!(params["redirect_uri"], "http://localhost:3000/callback");
        assert_eq!(params["state"], state);
        assert_eq!(params["scope"], "profile email");
        assert_eq!(params["code_challenge_method"], "S256");

        let issued = client.state_store().take(&state, "test_strategy").await.unwrap();
        let verifier = issued.code_verifier.unwrap();
        assert_eq!(
            params["code_challenge"],
            PkceChallenge::from_verifier(verifier).challenge
        );
    }

    #[tokio::test]
    async fn test_authorization_url_without_pkce_or_scopes() {
        let client = test_client();

        let config = test_config().with_pkce(false).with_scopes(Vec::new());
        let mut extra = HashMap::new();
        extra.insert("prompt".to_string(), "login".to_string());

        let (auth_url, _) = client.authorization_url(&config, extra).await.unwrap();

        let url = Url::parse(&auth_url).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert!(!params.contains_key("code_challenge"));
        assert!(!params.contains_key("scope"));
        assert_eq!(params["prompt"], "login");
    }

    #[tokio::test]
    async fn test_callback_for_other_strategy_is_rejected() {
        let client = test_client();
        let state = store_state(&client, "other").await;

        let callback = AuthorizationResponse {
            code: "code".to_string(),
            state: state.clone(),
            error: None,
            error_description: None,
        };

        let result = client.exchange_callback(&test_config(), callback).await;
        assert!(matches!(result, Err(OAuth2Error::InvalidState)));

        let owned = client.state_store().take(&state, "other").await.unwrap();
        assert_eq!(owned.strategy, "other");
    }

    #[tokio::test]
    async fn test_callback_error_is_reported() {
        let client = test_client();
        let state = store_state(&client, "test_strategy").await;

        let callback = AuthorizationResponse {
            code: String::new(),
            state: state.clone(),
            error: Some("access_denied".to_string()),
            error_description: Some("User declined".to_string()),
        };

        match client.exchange_callback(&test_config(), callback).await {
            Err(OAuth2Error::CallbackError(message)) => {
                assert_eq!(message, "access_denied: User declined")
            }
            other => panic!("Expected CallbackError, got: {:?}", other),
        }

        // The state was spent on the failed attempt.
        assert!(matches!(
            client.state_store().take(&state, "test_strategy").await,
            Err(OAuth2Error::StateNotFound)
        ));
    }
}
