//! OAuth2 error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("State not found or expired")]
    StateNotFound,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("User info request failed: {0}")]
    UserInfoFailed(String),

    /// Communication with the provider failed; `source` is the underlying cause.
    #[error("{message}")]
    InternalOAuth {
        message: String,
        #[source]
        source: Box<OAuth2Error>,
    },

    #[error("Response body is not valid UTF-8")]
    InvalidEncoding(#[source] std::string::FromUtf8Error),

    #[error("Failed to parse user profile")]
    ProfileParse(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Callback error: {0}")]
    CallbackError(String),
}

impl OAuth2Error {
    pub fn internal(message: impl Into<String>, source: OAuth2Error) -> Self {
        Self::InternalOAuth {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
