use async_trait::async_trait;

use crate::providers::ultradns::error::UltraDnsError;
use crate::providers::ultradns::types::{RRSet, RRSetKey, RRSetList, ZoneInfo};

#[async_trait]
pub trait ZoneService: Send + Sync {
    async fn read_zone(&self, zone_name: &str) -> Result<ZoneInfo, UltraDnsError>;
}

/// Record set operations. Any non-2xx answer is an `Err`.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn read(&self, key: &RRSetKey) -> Result<RRSetList, UltraDnsError>;
    async fn create(&self, key: &RRSetKey, rrset: &RRSet) -> Result<(), UltraDnsError>;
    async fn update(&self, key: &RRSetKey, rrset: &RRSet) -> Result<(), UltraDnsError>;
    async fn delete(&self, key: &RRSetKey) -> Result<(), UltraDnsError>;
}
