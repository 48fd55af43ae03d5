use std::fmt;
use std::time::Duration;

use tracing::warn;

use crate::auth::credentials::{CredentialManager, EnvCredentialManager};
use crate::error::Error;

pub const ENV_USERNAME: &str = "ULTRADNS_USERNAME";
pub const ENV_PASSWORD: &str = "ULTRADNS_PASSWORD";
pub const ENV_ENDPOINT: &str = "ULTRADNS_ENDPOINT";
pub const ENV_TTL: &str = "ULTRADNS_TTL";
pub const ENV_PROPAGATION_TIMEOUT: &str = "ULTRADNS_PROPAGATION_TIMEOUT";
pub const ENV_POLLING_INTERVAL: &str = "ULTRADNS_POLLING_INTERVAL";
pub const ENV_DISABLE_CNAME_SUPPORT: &str = "LEGO_DISABLE_CNAME_SUPPORT";

pub const DEFAULT_ENDPOINT: &str = "https://api.ultradns.com/";
/// TTL used for challenge records unless overridden.
pub const DEFAULT_TTL: u32 = 120;
pub const DEFAULT_PROPAGATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(4);

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub endpoint: String,
    pub ttl: u32,
    pub propagation_timeout: Duration,
    pub polling_interval: Duration,
    /// Follow a CNAME on the challenge name before looking up its zone.
    pub follow_cname: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    /// `ULTRADNS_USERNAME` and `ULTRADNS_PASSWORD` are required.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_credentials(&EnvCredentialManager::new())
    }

    pub fn from_credentials(creds: &impl CredentialManager) -> Result<Self, Error> {
        let username = creds.get(ENV_USERNAME)?;
        let password = creds.get(ENV_PASSWORD)?;

        Ok(Config {
            username,
            password,
            ..Self::defaults_from(creds)
        })
    }

    /// Optional settings only; credentials are left empty.
    pub fn defaults_from(creds: &impl CredentialManager) -> Self {
        Config {
            username: String::new(),
            password: String::new(),
            endpoint: creds
                .lookup(ENV_ENDPOINT)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ttl: parse_or(creds, ENV_TTL, DEFAULT_TTL),
            propagation_timeout: Duration::from_secs(parse_or(
                creds,
                ENV_PROPAGATION_TIMEOUT,
                DEFAULT_PROPAGATION_TIMEOUT.as_secs(),
            )),
            polling_interval: Duration::from_secs(parse_or(
                creds,
                ENV_POLLING_INTERVAL,
                DEFAULT_POLLING_INTERVAL.as_secs(),
            )),
            follow_cname: !parse_or(creds, ENV_DISABLE_CNAME_SUPPORT, false),
        }
    }
}

fn parse_or<T>(creds: &impl CredentialManager, key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    let Some(raw) = creds.lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable setting, using default");
            default
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            username: String::new(),
            password: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ttl: DEFAULT_TTL,
            propagation_timeout: DEFAULT_PROPAGATION_TIMEOUT,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            follow_cname: true,
        }
    }
}

// Keeps the password out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("ttl", &self.ttl)
            .field("propagation_timeout", &self.propagation_timeout)
            .field("polling_interval", &self.polling_interval)
            .field("follow_cname", &self.follow_cname)
            .finish()
    }
}
