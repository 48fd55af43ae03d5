use crate::error::Error;
use std::sync::Arc;
use tracing::debug;

/// Suffix for variables that point at a file holding the actual value.
pub const FILE_SUFFIX: &str = "_FILE";

pub trait CredentialManager: Send + Sync {
    /// Returns the value for `key`, or `None` when it is not set.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Like `lookup`, but a missing value is an error.
    fn get(&self, key: &str) -> Result<String, Error> {
        self.lookup(key)
            .ok_or_else(|| Error::missing_credentials(format!("{key} not set")))
    }
}

type Lookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Environment-backed credentials. `NAME` wins over `NAME_FILE`; the file
/// variant is read and trimmed.
#[derive(Clone)]
pub struct EnvCredentialManager {
    vars: Arc<Lookup>,
}

impl EnvCredentialManager {
    pub fn new() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_lookup<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self { vars: Arc::new(f) }
    }

    fn read_file_var(&self, key: &str) -> Option<String> {
        let path = (self.vars)(&format!("{key}{FILE_SUFFIX}"))?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content.trim().to_string()),
            Err(e) => {
                debug!(key, path = %path, error = %e, "Failed to read credential file");
                None
            }
        }
    }
}

impl Default for EnvCredentialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialManager for EnvCredentialManager {
    fn lookup(&self, key: &str) -> Option<String> {
        match (self.vars)(key) {
            Some(value) if !value.is_empty() => Some(value),
            _ => self.read_file_var(key).filter(|v| !v.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use std::io::Write;

    fn manager(pairs: &[(&str, &str)]) -> EnvCredentialManager {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvCredentialManager::with_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_direct_value() {
        let creds = manager(&[("ULTRADNS_USERNAME", "alice")]);
        assert_eq!(creds.get("ULTRADNS_USERNAME").unwrap(), "alice");
    }

    #[test]
    fn test_file_value_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let creds = manager(&[("ULTRADNS_PASSWORD_FILE", path.as_str())]);
        assert_eq!(creds.get("ULTRADNS_PASSWORD").unwrap(), "s3cret");
    }

    #[test]
    fn test_direct_value_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from-file").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let creds = manager(&[
            ("ULTRADNS_PASSWORD", "from-env"),
            ("ULTRADNS_PASSWORD_FILE", path.as_str()),
        ]);
        assert_eq!(creds.get("ULTRADNS_PASSWORD").unwrap(), "from-env");
    }

    #[test]
    fn test_missing_value() {
        let creds = manager(&[("ULTRADNS_USERNAME", "")]);
        let err = creds.get("ULTRADNS_USERNAME").unwrap_err();
        assert_matches!(err.kind(), ErrorKind::MissingCredentials(msg) if msg.contains("ULTRADNS_USERNAME"));
    }

    #[test]
    fn test_unreadable_file_is_missing() {
        let creds = manager(&[("ULTRADNS_PASSWORD_FILE", "/nonexistent/ultradns/password")]);
        assert!(creds.lookup("ULTRADNS_PASSWORD").is_none());
    }
}
