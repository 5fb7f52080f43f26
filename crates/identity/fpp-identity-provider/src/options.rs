//! Strategy options.

use fpp_identity_oauth2::{OAuth2Error, OAuth2Result, ProfileFieldMap};
use serde::{Deserialize, Deserializer};

/// Options for [`FppStrategy`](crate::FppStrategy).
///
/// Deserializes from the camelCase keys used by existing deployments
/// (`clientID`, `authorizationURL`, ...) and from their `Url`/`Id` spellings.
/// Endpoints left unset fall back to the public FPP ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FppOptions {
    #[serde(default, rename = "clientID", alias = "clientId", alias = "client_id")]
    pub client_id: String,

    #[serde(default, rename = "clientSecret", alias = "client_secret")]
    pub client_secret: String,

    #[serde(
        default,
        rename = "callbackURL",
        alias = "callbackUrl",
        alias = "callback_url"
    )]
    pub callback_url: Option<String>,

    #[serde(
        default,
        rename = "authorizationURL",
        alias = "authorizationUrl",
        alias = "authorization_url"
    )]
    pub authorization_url: Option<String>,

    #[serde(default, rename = "tokenURL", alias = "tokenUrl", alias = "token_url")]
    pub token_url: Option<String>,

    #[serde(
        default,
        rename = "profileURL",
        alias = "profileUrl",
        alias = "profile_url"
    )]
    pub profile_url: Option<String>,

    /// Reserved for restricting the requested profile fields; not sent to FPP.
    #[serde(default, rename = "profileFields", alias = "profile_fields")]
    pub profile_fields: Option<Vec<String>>,

    /// Overrides which user-info fields feed `id`, `username` and `displayName`.
    #[serde(default, rename = "profileFieldMap", alias = "profile_field_map")]
    pub profile_field_map: Option<ProfileFieldMap>,

    /// Space separated string or list.
    #[serde(default, deserialize_with = "deserialize_scope")]
    pub scope: Vec<String>,

    #[serde(default)]
    pub pkce: bool,
}

impl FppOptions {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    /// Reads `FPP_CLIENT_ID` and `FPP_CLIENT_SECRET`, plus the optional
    /// `FPP_CALLBACK_URL`, `FPP_AUTHORIZATION_URL`, `FPP_TOKEN_URL` and
    /// `FPP_PROFILE_URL`.
    pub fn from_env() -> OAuth2Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with variables resolved by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> OAuth2Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                OAuth2Error::ConfigError(format!("{} environment variable is required", key))
            })
        };

        Ok(Self {
            client_id: required("FPP_CLIENT_ID")?,
            client_secret: required("FPP_CLIENT_SECRET")?,
            callback_url: lookup("FPP_CALLBACK_URL"),
            authorization_url: lookup("FPP_AUTHORIZATION_URL"),
            token_url: lookup("FPP_TOKEN_URL"),
            profile_url: lookup("FPP_PROFILE_URL"),
            ..Self::default()
        })
    }
}

fn deserialize_scope<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scope {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Scope::deserialize(deserializer)? {
        Scope::Joined(scope) => scope.split_whitespace().map(String::from).collect(),
        Scope::List(scopes) => scopes,
    })
}
