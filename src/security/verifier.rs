//! Challenge verification backends and the issued-token store.
//!
//! The relay treats challenge verification as an external capability: the
//! backends here answer "is this challenge response valid?" and keep the
//! only cross-request state in the system, the issued-token store. Both are
//! owned by the access gate and never touched by the pipeline directly.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;
use serde::Deserialize;

use crate::config::{GateConfig, GateMode};

/// In-memory store of minted session tokens with a fixed TTL.
///
/// Entries expire lazily: a lookup past the deadline removes the entry, and
/// every mint sweeps the expired remainder so the map stays bounded by the
/// active caller population.
pub struct TokenStore {
    tokens: DashMap<String, Instant>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// True if `token` was minted here and has not expired.
    pub fn accept(&self, token: &str) -> bool {
        // The shard guard must drop before the remove below.
        let valid = match self.tokens.get(token) {
            Some(expiry) => *expiry > Instant::now(),
            None => return false,
        };
        if !valid {
            self.tokens.remove(token);
        }
        valid
    }

    /// Mint a fresh opaque token.
    pub fn mint(&self) -> String {
        let now = Instant::now();
        self.tokens.retain(|_, expiry| *expiry > now);

        let token = format!("{:032x}", rand::thread_rng().gen::<u128>());
        self.tokens.insert(token.clone(), now + self.ttl);
        token
    }
}

/// Challenge verification backend.
pub enum Verifier {
    /// Gate disabled; never consulted.
    Disabled,
    /// Challenge answers are compared against a locally configured secret.
    Local { secret: String },
    /// Challenge answers are POSTed to a remote siteverify endpoint.
    Siteverify {
        secret: String,
        endpoint: String,
        client: reqwest::Client,
    },
}

#[derive(Deserialize)]
struct SiteverifyOutcome {
    success: bool,
}

impl Verifier {
    pub fn from_config(config: &GateConfig) -> Self {
        match config.mode {
            GateMode::Disabled => Verifier::Disabled,
            GateMode::Local => Verifier::Local {
                secret: config.challenge_secret.clone(),
            },
            GateMode::Siteverify => Verifier::Siteverify {
                secret: config.challenge_secret.clone(),
                endpoint: config.siteverify_url.clone(),
                client: reqwest::Client::new(),
            },
        }
    }

    /// Check a challenge answer against the backend.
    ///
    /// Verification failures of any kind (wrong answer, unreachable
    /// endpoint, malformed verdict) are a denial, never an error.
    pub async fn challenge_valid(&self, answer: &str) -> bool {
        match self {
            Verifier::Disabled => true,
            Verifier::Local { secret } => !secret.is_empty() && answer == secret,
            Verifier::Siteverify {
                secret,
                endpoint,
                client,
            } => {
                let result = client
                    .post(endpoint)
                    .form(&[("secret", secret.as_str()), ("response", answer)])
                    .send()
                    .await;
                match result {
                    Ok(response) => match response.json::<SiteverifyOutcome>().await {
                        Ok(outcome) => outcome.success,
                        Err(e) => {
                            tracing::warn!(error = %e, "Malformed siteverify response");
                            false
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Siteverify request failed");
                        false
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_is_accepted() {
        let store = TokenStore::new(Duration::from_secs(60));
        let token = store.mint();
        assert!(store.accept(&token));
        assert!(!store.accept("not-a-token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let store = TokenStore::new(Duration::ZERO);
        let token = store.mint();
        assert!(!store.accept(&token));
    }

    #[tokio::test]
    async fn local_verifier_matches_secret_only() {
        let verifier = Verifier::Local {
            secret: "s3cret".into(),
        };
        assert!(verifier.challenge_valid("s3cret").await);
        assert!(!verifier.challenge_valid("wrong").await);
        assert!(!verifier.challenge_valid("").await);
    }

    #[tokio::test]
    async fn empty_local_secret_never_validates() {
        let verifier = Verifier::Local { secret: String::new() };
        assert!(!verifier.challenge_valid("").await);
    }
}
