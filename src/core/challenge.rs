use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

/// What a DNS-01 challenge needs published for one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeInfo {
    /// `_acme-challenge.<domain>.`
    pub fqdn: String,
    /// Name the TXT record is actually written to; differs from `fqdn`
    /// when the challenge name is delegated with a CNAME.
    pub effective_fqdn: String,
    /// base64url(SHA-256(key authorization)), unpadded.
    pub value: String,
}

impl ChallengeInfo {
    pub fn new(domain: &str, key_auth: &str) -> Self {
        let fqdn = challenge_fqdn(domain);
        Self {
            effective_fqdn: fqdn.clone(),
            fqdn,
            value: challenge_value(key_auth),
        }
    }
}

pub fn challenge_value(key_auth: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(key_auth.as_bytes()))
}

/// Absolute form of `name`, lower-cased, with a trailing dot.
pub fn to_fqdn(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{name}.")
    }
}

pub fn challenge_fqdn(domain: &str) -> String {
    let domain = domain.strip_prefix("*.").unwrap_or(domain);
    to_fqdn(&format!("{ACME_CHALLENGE_LABEL}.{domain}"))
}
