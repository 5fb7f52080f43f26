//! Pending authorization requests, keyed by the `state` parameter sent to the provider.

use crate::error::{OAuth2Error, OAuth2Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2State {
    pub state: String,
    /// Strategy that issued the state; only it may redeem it
    pub strategy: String,
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl OAuth2State {
    /// Issue a fresh random state for `strategy`, valid for `ttl`.
    pub fn issue(
        strategy: impl Into<String>,
        redirect_uri: impl Into<String>,
        code_verifier: Option<String>,
        ttl: TimeDelta,
    ) -> OAuth2Result<Self> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| ttl_out_of_range(ttl.num_seconds()))?;

        Ok(Self {
            state: Uuid::new_v4().to_string(),
            strategy: strategy.into(),
            redirect_uri: redirect_uri.into(),
            code_verifier,
            expires_at,
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Converts a configured TTL in seconds, rejecting values no timestamp can hold.
pub fn state_ttl(seconds: u64) -> OAuth2Result<TimeDelta> {
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
        .ok_or_else(|| ttl_out_of_range(seconds))
}

fn ttl_out_of_range(seconds: impl std::fmt::Display) -> OAuth2Error {
    OAuth2Error::ConfigError(format!("State TTL of {} seconds is out of range", seconds))
}

#[async_trait]
pub trait OAuth2StateStore: Send + Sync {
    async fn store(&self, state: OAuth2State) -> OAuth2Result<()>;

    /// Remove and return the state if `strategy` issued it.
    ///
    /// Unknown or expired states yield `StateNotFound`. A state issued by a
    /// different strategy yields `InvalidState` and stays redeemable by its owner.
    async fn take(&self, state: &str, strategy: &str) -> OAuth2Result<OAuth2State>;

    /// Drop expired states, returning how many were removed
    async fn purge_expired(&self) -> OAuth2Result<usize>;
}

#[derive(Default)]
pub struct InMemoryStateStore {
    pending: RwLock<HashMap<String, OAuth2State>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OAuth2StateStore for InMemoryStateStore {
    async fn store(&self, state: OAuth2State) -> OAuth2Result<()> {
        self.pending
            .write()
            .await
            .insert(state.state.clone(), state);
        Ok(())
    }

    async fn take(&self, state: &str, strategy: &str) -> OAuth2Result<OAuth2State> {
        let mut pending = self.pending.write().await;

        let Entry::Occupied(entry) = pending.entry(state.to_string()) else {
            return Err(OAuth2Error::StateNotFound);
        };

        if entry.get().strategy != strategy {
            warn!(
                "State issued by {} was presented to {}",
                entry.get().strategy,
                strategy
            );
            return Err(OAuth2Error::InvalidState);
        }

        let taken = entry.remove();
        if taken.is_expired() {
            return Err(OAuth2Error::StateNotFound);
        }

        Ok(taken)
    }

    async fn purge_expired(&self) -> OAuth2Result<usize> {
        let mut pending = self.pending.write().await;
        let before = pending.len();
        let now = Utc::now();

        pending.retain(|_, state| state.expires_at >= now);

        Ok(before - pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue_for(strategy: &str) -> OAuth2State {
        OAuth2State::issue(
            strategy,
            "http://localhost:3000/auth/fpp/callback",
            Some("verifier123".to_string()),
            TimeDelta::minutes(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_state_is_redeemed_once() {
        let store = InMemoryStateStore::new();
        let issued = issue_for("fpp");
        let key = issued.state.clone();
        store.store(issued).await.unwrap();

        let taken = store.take(&key, "fpp").await.unwrap();
        assert_eq!(taken.strategy, "fpp");
        assert_eq!(taken.code_verifier.as_deref(), Some("verifier123"));

        assert!(matches!(
            store.take(&key, "fpp").await,
            Err(OAuth2Error::StateNotFound)
        ));
    }

    #[tokio::test]
    async fn test_foreign_strategy_leaves_state_in_place() {
        let store = InMemoryStateStore::new();
        let issued = issue_for("fpp");
        let key = issued.state.clone();
        store.store(issued).await.unwrap();

        assert!(matches!(
            store.take(&key, "other").await,
            Err(OAuth2Error::InvalidState)
        ));
        assert!(store.take(&key, "fpp").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let store = InMemoryStateStore::new();
        let mut issued = issue_for("fpp");
        issued.expires_at = Utc::now() - TimeDelta::seconds(1);
        let key = issued.state.clone();
        store.store(issued).await.unwrap();

        assert!(matches!(
            store.take(&key, "fpp").await,
            Err(OAuth2Error::StateNotFound)
        ));
    }

    #[tokio::test]
    async fn test_purge_only_drops_expired() {
        let store = InMemoryStateStore::new();

        let mut stale = issue_for("fpp");
        stale.expires_at = Utc::now() - TimeDelta::minutes(1);
        let live = issue_for("fpp");
        let live_key = live.state.clone();

        store.store(stale).await.unwrap();
        store.store(live).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.take(&live_key, "fpp").await.is_ok());
    }

    #[test]
    fn test_issued_states_are_unique_uuids() {
        let a = issue_for("fpp");
        let b = issue_for("fpp");

        assert_ne!(a.state, b.state);
        assert!(Uuid::parse_str(&a.state).is_ok());
        assert!(!a.is_expired());
    }

    #[test]
    fn test_state_ttl_bounds() {
        assert_eq!(state_ttl(600).unwrap(), TimeDelta::seconds(600));
        assert!(matches!(state_ttl(u64::MAX), Err(OAuth2Error::ConfigError(_))));
        assert!(matches!(
            state_ttl(100_000_000_000_000_000),
            Err(OAuth2Error::ConfigError(_))
        ));
    }
}
