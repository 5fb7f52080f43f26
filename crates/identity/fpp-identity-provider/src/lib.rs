//! FPP authentication strategy.
//!
//! Authenticates users against FPP (`auth.osufpp.org`) with the OAuth2
//! authorization-code flow and normalizes its user-info document into a
//! [`Profile`].
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use fpp_identity_core::StrategyRegistry;
//! use fpp_identity_provider::{FppOptions, FppStrategy};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! let strategy = Arc::new(FppStrategy::new(
//!     FppOptions::new("123-456-789", "shhh-its-a-secret")
//!         .with_callback_url("https://www.example.net/auth/fpp/callback"),
//! )?);
//!
//! let registry = StrategyRegistry::new();
//! registry.register(strategy.clone()).await;
//!
//! let (redirect_to, _state) = strategy.authorization_url(HashMap::new()).await?;
//! # let _ = redirect_to;
//! # Ok(())
//! # }
//! ```

mod options;
pub mod profile;
mod strategy;

pub use options::FppOptions;
pub use strategy::{
    DEFAULT_AUTHORIZATION_URL, DEFAULT_PROFILE_URL, DEFAULT_TOKEN_URL, FppStrategy, STRATEGY_NAME,
};

pub use fpp_identity_core::{IdentityProvider, Profile};
