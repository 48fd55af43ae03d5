//! DNS-01 challenge solver for UltraDNS.
//!
//! [`DNSProvider`] publishes the `_acme-challenge` TXT record for a domain
//! through the UltraDNS REST API and removes it again once the ACME server
//! has validated it.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod providers;

pub use crate::config::Config;
pub use crate::core::provider::ChallengeProvider;
pub use crate::error::{Error, ErrorKind};
pub use crate::providers::ultradns::DNSProvider;
