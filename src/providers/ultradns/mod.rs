//! UltraDNS DNS-01 provider implementation

pub mod client;
pub mod error;
pub mod service;
pub mod types;


pub use client::{UltraDnsClient, UltraDnsClientConfig};
pub use error::UltraDnsError;
pub use service::{RecordService, ZoneService};
pub use types::{RRSet, RRSetKey, RRSetList, ZoneInfo};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::challenge::{ACME_CHALLENGE_LABEL, ChallengeInfo};
use crate::core::provider::ChallengeProvider;
use crate::core::zone::{SoaZoneResolver, ZoneResolver};
use crate::error::{Error, ErrorKind};
use types::RECORD_TYPE_TXT;

/// Where a challenge record goes once zone aliases are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    zone: String,
    owner: String,
    value: String,
}

/// Publishes and removes DNS-01 TXT records through the UltraDNS API.
pub struct DNSProvider<C = UltraDnsClient> {
    config: Config,
    client: C,
    resolver: Arc<dyn ZoneResolver>,
}

impl DNSProvider<UltraDnsClient> {
    /// Builds a provider from `ULTRADNS_*` environment variables.
    pub async fn from_env() -> Result<Self, Error> {
        Self::new(Config::from_env()?).await
    }

    /// Builds the API client (authenticating against UltraDNS) and a zone
    /// resolver over the system DNS configuration.
    pub async fn new(config: Config) -> Result<Self, Error> {
        if config.username.is_empty() {
            return Err(Error::configuration("username is empty"));
        }
        if config.password.is_empty() {
            return Err(Error::configuration("password is empty"));
        }

        let client = UltraDnsClient::new(UltraDnsClientConfig {
            username: config.username.clone(),
            password: config.password.clone(),
            endpoint: config.endpoint.clone(),
        })
        .await
        .map_err(|e| Error::new(ErrorKind::Client(e)))?;

        let resolver = SoaZoneResolver::from_system_conf()
            .map_err(|e| Error::configuration(format!("could not load system resolver: {e}")))?;

        Ok(Self::with_parts(config, client, Arc::new(resolver)))
    }
}

impl<C> DNSProvider<C>
where
    C: ZoneService + RecordService,
{
    pub fn with_parts(config: Config, client: C, resolver: Arc<dyn ZoneResolver>) -> Self {
        Self {
            config,
            client,
            resolver,
        }
    }

    async fn challenge_info(&self, domain: &str, key_auth: &str) -> ChallengeInfo {
        let mut info = ChallengeInfo::new(domain, key_auth);
        if self.config.follow_cname {
            match self.resolver.resolve_cname(&info.fqdn).await {
                Ok(target) => info.effective_fqdn = target,
                Err(e) => debug!(fqdn = %info.fqdn, error = %e, "CNAME lookup failed, using challenge name"),
            }
        }
        info
    }

    async fn target(&self, domain: &str, key_auth: &str) -> Result<Target, Error> {
        let info = self.challenge_info(domain, key_auth).await;

        let auth_zone = self
            .resolver
            .find_zone_by_fqdn(&info.effective_fqdn)
            .await
            .map_err(|e| Error::zone_not_found(domain, e))?;

        let zone = self.client.read_zone(&auth_zone).await?;

        let (zone, owner) = match zone.alias_of() {
            Some(original) => {
                debug!(zone = %auth_zone, original, "Zone is an alias, targeting original zone");
                (
                    original.to_string(),
                    format!("{ACME_CHALLENGE_LABEL}.{original}"),
                )
            }
            None => (auth_zone, info.effective_fqdn),
        };

        Ok(Target {
            zone,
            owner,
            value: info.value,
        })
    }

    fn rrset(&self, target: &Target) -> RRSet {
        // ownerName carries the zone, not the record owner; the owner is in the key.
        RRSet {
            owner_name: target.zone.clone(),
            rr_type: RECORD_TYPE_TXT.to_string(),
            ttl: self.config.ttl,
            rdata: vec![target.value.clone()],
        }
    }
}

#[async_trait]
impl<C> ChallengeProvider for DNSProvider<C>
where
    C: ZoneService + RecordService,
{
    async fn present(&self, domain: &str, _token: &str, key_auth: &str) -> Result<(), Error> {
        let target = self.target(domain, key_auth).await?;
        let key = RRSetKey::txt(&target.owner, &target.zone);
        let rrset = self.rrset(&target);

        info!(
            domain,
            zone = %target.zone,
            owner = %target.owner,
            "Presenting DNS-01 challenge record"
        );

        match self.client.read(&key).await {
            Ok(_) => {
                debug!(owner = %key.owner, "TXT record exists, updating");
                self.client.update(&key, &rrset).await?;
            }
            Err(e) => {
                debug!(owner = %key.owner, error = %e, "No readable TXT record, creating");
                self.client.create(&key, &rrset).await?;
            }
        }
        Ok(())
    }

    async fn cleanup(&self, domain: &str, _token: &str, key_auth: &str) -> Result<(), Error> {
        let target = self.target(domain, key_auth).await?;
        let key = RRSetKey::txt(&target.owner, &target.zone);

        info!(
            domain,
            zone = %target.zone,
            owner = %target.owner,
            "Cleaning up DNS-01 challenge record"
        );

        self.client.delete(&key).await?;
        Ok(())
    }

    fn timeout(&self) -> (Duration, Duration) {
        (
            self.config.propagation_timeout,
            self.config.polling_interval,
        )
    }
}
