use std::fmt;

use crate::core::zone::ZoneLookupError;
use crate::providers::ultradns::UltraDnsError;

/// Prefix attached to every error surfaced by the provider.
pub const NAMESPACE: &str = "ultradns";

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("the configuration of the DNS provider is invalid: {0}")]
    Configuration(String),

    #[error("some credentials information are missing: {0}")]
    MissingCredentials(String),

    #[error("could not create API client: {0}")]
    Client(#[source] UltraDnsError),

    #[error("could not find zone for domain {domain:?}: {source}")]
    ZoneNotFound {
        domain: String,
        #[source]
        source: ZoneLookupError,
    },

    #[error(transparent)]
    Api(#[from] UltraDnsError),
}

/// Error returned by every provider operation: a fixed namespace plus the
/// underlying cause, kept typed so callers can match on it.
#[derive(Debug)]
pub struct Error {
    namespace: &'static str,
    kind: ErrorKind,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            namespace: NAMESPACE,
            kind,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration(msg.into()))
    }

    pub fn missing_credentials(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingCredentials(msg.into()))
    }

    pub fn zone_not_found(domain: &str, source: ZoneLookupError) -> Self {
        Self::new(ErrorKind::ZoneNotFound {
            domain: domain.to_string(),
            source,
        })
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<UltraDnsError> for Error {
    fn from(err: UltraDnsError) -> Self {
        Self::new(ErrorKind::Api(err))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.namespace, self.kind)
    }
}
