use serde::{Deserialize, Serialize};

pub const RECORD_TYPE_TXT: &str = "TXT";

/// Identifies one record set: `zones/{zone}/rrsets/{type}/{owner}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRSetKey {
    pub owner: String,
    pub zone: String,
    pub record_type: String,
}

impl RRSetKey {
    pub fn txt(owner: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            zone: zone.into(),
            record_type: RECORD_TYPE_TXT.to_string(),
        }
    }

    /// Unencoded path segments below the API version.
    pub fn path(&self) -> [&str; 5] {
        [
            "zones",
            &self.zone,
            "rrsets",
            &self.record_type,
            &self.owner,
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RRSet {
    pub owner_name: String,
    #[serde(rename = "rrtype")]
    pub rr_type: String,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub rdata: Vec<String>,
}

/// Body of a successful record set read.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RRSetList {
    #[serde(default)]
    pub zone_name: Option<String>,
    #[serde(default)]
    pub rr_sets: Vec<RRSet>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneProperties {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub zone_type: String,
}

/// Zone metadata. `original_zone_name` is only set for alias zones.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneInfo {
    #[serde(default)]
    pub properties: Option<ZoneProperties>,
    #[serde(default)]
    pub original_zone_name: String,
}

impl ZoneInfo {
    pub fn alias_of(&self) -> Option<&str> {
        Some(self.original_zone_name.as_str()).filter(|name| !name.is_empty())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Seconds {
    Number(u64),
    Text(String),
}

impl Seconds {
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            Seconds::Number(n) => Some(*n),
            Seconds::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Token grant response. UltraDNS has been seen sending camelCase, snake_case
/// or both spellings in one body, so each is kept separately.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TokenResponse {
    #[serde(default, rename = "accessToken")]
    access_token_camel: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    refresh_token_camel: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default, rename = "expiresIn")]
    expires_in_camel: Option<Seconds>,
    #[serde(default)]
    expires_in: Option<Seconds>,
}

impl TokenResponse {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token_camel
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token_camel
            .as_deref()
            .or(self.refresh_token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in_camel
            .as_ref()
            .or(self.expires_in.as_ref())
            .and_then(Seconds::as_secs)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ApiErrorDetail {
    #[serde(default, rename = "errorCode")]
    pub error_code: Option<i64>,
    #[serde(default, rename = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl ApiErrorDetail {
    pub fn message(&self) -> Option<&str> {
        self.error_message
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

/// UltraDNS answers errors with a list, some endpoints with a bare object.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum ApiErrorBody {
    List(Vec<ApiErrorDetail>),
    Single(ApiErrorDetail),
}

impl ApiErrorBody {
    pub fn first(&self) -> Option<&ApiErrorDetail> {
        match self {
            ApiErrorBody::List(list) => list.first(),
            ApiErrorBody::Single(detail) => Some(detail),
        }
    }
}
