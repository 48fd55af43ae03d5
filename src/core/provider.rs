use crate::error::Error;
use async_trait::async_trait;
use std::time::Duration;

/// Contract between a DNS-01 solver and the ACME client driving it.
#[async_trait]
pub trait ChallengeProvider: Send + Sync {
    /// Publishes the TXT record for `domain`.
    async fn present(&self, domain: &str, token: &str, key_auth: &str) -> Result<(), Error>;

    /// Removes the TXT record published by `present`.
    async fn cleanup(&self, domain: &str, token: &str, key_auth: &str) -> Result<(), Error>;

    /// `(propagation timeout, polling interval)` for the caller's propagation check.
    fn timeout(&self) -> (Duration, Duration);
}
