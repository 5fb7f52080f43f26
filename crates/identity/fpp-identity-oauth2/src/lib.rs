//! Generic OAuth2 authorization-code strategy with PKCE support.
//!
//! An [`OAuth2Strategy`] is assembled from an [`OAuth2StrategyConfig`] (endpoints,
//! credentials, flow settings) and a [`ProfileMapper`] that normalizes the
//! provider's user-info payload. It implements the fpp-identity-core
//! [`IdentityProvider`] trait so it can be registered with a host.

mod client;
mod config;
mod error;
mod mapper;
mod state;
mod strategy;
mod types;


pub use client::{OAuth2Client, PkceChallenge};
pub use config::{OAuth2StrategyConfig, ProfileFieldMap};
pub use error::{OAuth2Error, OAuth2Result};
pub use mapper::{ProfileMapper, first_string};
pub use state::{InMemoryStateStore, OAuth2State, OAuth2StateStore};
pub use strategy::{OAuth2AuthPayload, OAuth2Strategy};
pub use types::{AuthorizationResponse, OAuth2Login, TokenResponse};

// Re-export common types for convenience
pub use fpp_identity_core::{IdentityProvider, Profile};
