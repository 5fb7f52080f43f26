use anyhow::{Context, Result};
use axum::http::{Method, StatusCode};
use axum::{
    Json, Router,
    extract::{Query, State},
    response::{Html, Redirect},
    routing::get,
};
use fpp_identity_core::{IdentityError, Profile, StrategyRegistry};
use fpp_identity_provider::{FppOptions, FppStrategy, STRATEGY_NAME};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server settings for the demo
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }

    fn default_callback_url(&self) -> String {
        format!("http://localhost:{}/auth/fpp/callback", self.server_port)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: StrategyRegistry,
    pub strategy: Arc<FppStrategy>,
}

/// Query parameters FPP appends to the callback URL
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

type HandlerError = (StatusCode, String);

async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head><title>FPP Login</title></head>
<body>
    <h1>FPP Login Demo</h1>
    <p><a href="/auth/fpp">Sign in with FPP</a></p>
</body>
</html>
"#,
    )
}

async fn health_handler() -> &'static str {
    "ok"
}

/// Redirects the browser to FPP's authorization dialog
async fn start_handler(State(state): State<AppState>) -> Result<Redirect, HandlerError> {
    let (url, _state) = state
        .strategy
        .authorization_url(HashMap::new())
        .await
        .map_err(|e| {
            error!("Failed to build authorization URL: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!("Redirecting to FPP authorization endpoint");
    Ok(Redirect::to(&url))
}

async fn callback_handler(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<Profile>, HandlerError> {
    let state_param = query.state.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Missing state parameter in callback".to_string(),
        )
    })?;

    let payload = serde_json::json!({
        "type": "Callback",
        "code": query.code.unwrap_or_default(),
        "state": state_param,
        "error": query.error,
        "error_description": query.error_description,
    });

    let profile = state
        .registry
        .authenticate(STRATEGY_NAME, payload)
        .await
        .map_err(|e| {
            warn!("FPP authentication failed: {}", e);
            let status = match &e {
                IdentityError::InvalidPayload => StatusCode::BAD_REQUEST,
                IdentityError::ProviderNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::UNAUTHORIZED,
            };
            (status, e.to_string())
        })?;

    info!("Authenticated {} user {}", profile.provider, profile.id);
    Ok(Json(profile))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let mut options = FppOptions::from_env().context("Failed to load FPP options")?;
    if options.callback_url.is_none() {
        options.callback_url = Some(config.default_callback_url());
    }
    let callback_url = options.callback_url.clone().unwrap_or_default();

    let strategy = Arc::new(FppStrategy::new(options).context("Failed to create FPP strategy")?);

    let registry = StrategyRegistry::new();
    registry.register(strategy.clone()).await;
    info!("Registered strategies: {:?}", registry.names().await);

    let app_state = AppState { registry, strategy };

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/auth/fpp", get(start_handler))
        .route("/auth/fpp/callback", get(callback_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        )
        .with_state(app_state);

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);
    info!("FPP callback URL: {}", callback_url);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
