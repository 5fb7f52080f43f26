//! OAuth2 strategy configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Endpoints, credentials and flow settings for one OAuth2 strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2StrategyConfig {
    /// Name the strategy is registered under
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Additional parameters to include in authorization request
    pub auth_params: HashMap<String, String>,
    /// Whether to use PKCE (recommended for public clients)
    pub use_pkce: bool,
    pub state_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
}

impl OAuth2StrategyConfig {
    pub fn new(
        name: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
        profile_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client_id: String::new(),
            client_secret: String::new(),
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            profile_url: profile_url.into(),
            redirect_uri: String::new(),
            scopes: Vec::new(),
            auth_params: HashMap::new(),
            use_pkce: false,
            state_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
        }
    }

    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.insert(key.into(), value.into());
        self
    }

    pub fn with_pkce(mut self, use_pkce: bool) -> Self {
        self.use_pkce = use_pkce;
        self
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}

/// Names of the payload fields a profile is read from.
///
/// Each list is tried in order; the first field holding a string, number or bool wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFieldMap {
    pub id_fields: Vec<String>,
    pub username_fields: Vec<String>,
    pub display_name_fields: Vec<String>,
}

impl Default for ProfileFieldMap {
    fn default() -> Self {
        Self {
            id_fields: vec!["sub".to_string(), "id".to_string()],
            username_fields: vec!["preferred_username".to_string(), "username".to_string()],
            display_name_fields: vec!["name".to_string()],
        }
    }
}
