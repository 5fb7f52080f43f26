//! OAuth2 protocol types.

use fpp_identity_core::Profile;
use serde::{Deserialize, Serialize};

/// Response from OAuth2 authorization callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: String,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth2 token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// Outcome of a completed authorization-code flow
#[derive(Debug, Clone)]
pub struct OAuth2Login {
    pub tokens: TokenResponse,
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_optional_fields() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "Bearer"
        }"#;

        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.token_type, "Bearer");
        assert!(tokens.expires_in.is_none());
        assert!(tokens.refresh_token.is_none());
    }

    #[test]
    fn test_token_response_full() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "def",
            "scope": "profile"
        }"#;

        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.expires_in, Some(3600));
        assert_eq!(tokens.refresh_token.as_deref(), Some("def"));
        assert_eq!(tokens.scope.as_deref(), Some("profile"));
    }
}
