//! Authoritative zone lookup for challenge names.

use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use hickory_resolver::proto::rr::{Name, Record, RecordType};
use hickory_resolver::{ResolveError, Resolver, TokioResolver};
use thiserror::Error;
use tracing::{debug, trace};

use crate::core::challenge::to_fqdn;

/// Upper bound on CNAME hops when following a delegated challenge name.
const MAX_CNAME_HOPS: usize = 50;

#[derive(Error, Debug)]
pub enum ZoneLookupError {
    #[error("no SOA record found for {0}")]
    NotFound(String),

    #[error("invalid domain name {name:?}: {message}")]
    InvalidName { name: String, message: String },

    #[error("DNS lookup failed: {0}")]
    Resolve(#[from] ResolveError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneResolver: Send + Sync {
    /// Walks up from `fqdn` and returns the first name that owns an SOA
    /// record, in absolute form (`example.com.`).
    async fn find_zone_by_fqdn(&self, fqdn: &str) -> Result<String, ZoneLookupError>;

    /// Follows the CNAME chain starting at `fqdn` and returns the final
    /// target, or `fqdn` itself when there is no CNAME.
    async fn resolve_cname(&self, fqdn: &str) -> Result<String, ZoneLookupError>;
}

/// Resolver over the system DNS configuration.
pub struct SoaZoneResolver {
    resolver: TokioResolver,
}

impl SoaZoneResolver {
    pub fn from_system_conf() -> Result<Self, ZoneLookupError> {
        let resolver = Resolver::builder_tokio()?.build();
        Ok(Self { resolver })
    }
}

fn parse_name(fqdn: &str) -> Result<Name, ZoneLookupError> {
    Name::from_str(&to_fqdn(fqdn)).map_err(|e| ZoneLookupError::InvalidName {
        name: fqdn.to_string(),
        message: e.to_string(),
    })
}

fn is_absent(err: &ResolveError) -> bool {
    err.is_no_records_found() || err.is_nx_domain()
}

/// Zone apex named by an SOA answer for `name`. An answer that went through
/// a CNAME belongs to the alias target's zone and does not count.
fn zone_from_records(name: &Name, records: &[Record]) -> Option<String> {
    if records
        .iter()
        .any(|record| record.record_type() == RecordType::CNAME)
    {
        return None;
    }
    records
        .iter()
        .find(|record| record.record_type() == RecordType::SOA && record.name() == name)
        .map(|record| record.name().to_utf8())
}

/// Strips labels from `fqdn` until `lookup` answers with an SOA owned by the
/// queried name. Fails once the root is reached.
async fn walk_up<F, Fut>(fqdn: &str, mut lookup: F) -> Result<String, ZoneLookupError>
where
    F: FnMut(Name) -> Fut,
    Fut: Future<Output = Result<Vec<Record>, ResolveError>>,
{
    let mut name = parse_name(fqdn)?;

    while name.num_labels() > 0 {
        trace!(name = %name, "Looking up SOA");
        let records = lookup(name.clone()).await?;
        if let Some(zone) = zone_from_records(&name, &records) {
            debug!(fqdn, zone = %zone, "Found authoritative zone");
            return Ok(zone);
        }
        name = name.base_name();
    }

    Err(ZoneLookupError::NotFound(fqdn.to_string()))
}

#[async_trait]
impl ZoneResolver for SoaZoneResolver {
    async fn find_zone_by_fqdn(&self, fqdn: &str) -> Result<String, ZoneLookupError> {
        let resolver = &self.resolver;
        walk_up(fqdn, move |name| async move {
            match resolver.soa_lookup(name).await {
                Ok(lookup) => Ok(lookup.as_lookup().records().to_vec()),
                Err(e) if is_absent(&e) => Ok(Vec::new()),
                Err(e) => Err(e),
            }
        })
        .await
    }

    async fn resolve_cname(&self, fqdn: &str) -> Result<String, ZoneLookupError> {
        let mut name = parse_name(fqdn)?;

        for _ in 0..MAX_CNAME_HOPS {
            let lookup = match self.resolver.lookup(name.clone(), RecordType::CNAME).await {
                Ok(lookup) => lookup,
                Err(e) if is_absent(&e) => break,
                Err(e) => return Err(e.into()),
            };
            let Some(target) = lookup.iter().find_map(|rdata| rdata.as_cname()) else {
                break;
            };
            debug!(from = %name, to = %target.0, "Following CNAME");
            name = target.0.clone();
        }

        Ok(name.to_utf8())
    }
}
