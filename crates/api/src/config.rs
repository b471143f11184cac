//! Service configuration, read from environment variables.
//!
//! | variable | default | meaning |
//! |---|---|---|
//! | `ROSTER_BIND` | `0.0.0.0:8080` | listen address |
//! | `DATABASE_URL` | unset | Postgres URL; unset selects the in-memory stores |
//! | `ROSTER_API_KEYS` | empty | `token:role:owner` entries separated by `;` |

use std::net::SocketAddr;

use thiserror::Error;

use roster_auth::{CredentialRecord, Role};

pub const BIND_ENV: &str = "ROSTER_BIND";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const API_KEYS_ENV: &str = "ROSTER_API_KEYS";

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ROSTER_BIND: '{value}' is not a socket address")]
    InvalidBind { value: String },

    // Entries are referred to by position so tokens never reach the logs.
    #[error("ROSTER_API_KEYS: entry {index} is not of the form token:role[:owner]")]
    MalformedApiKey { index: usize },

    #[error("ROSTER_API_KEYS: entry {index} has unknown role '{role}'")]
    UnknownRole { index: usize, role: String },
}

/// One API key configured for the in-memory credential store.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeyEntry {
    pub token: String,
    pub record: CredentialRecord,
}

impl core::fmt::Debug for ApiKeyEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiKeyEntry")
            .field("token", &"<redacted>")
            .field("record", &self.record)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: Option<String>,
    pub api_keys: Vec<ApiKeyEntry>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = var(BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind { value: bind_raw.clone() })?;

        let api_keys = match var(API_KEYS_ENV) {
            Some(raw) => parse_api_keys(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bind,
            database_url: var(DATABASE_URL_ENV),
            api_keys,
        })
    }
}

/// Parse `token:role[:owner];...`. Blank entries are skipped; roles must be
/// one of the known roles.
pub fn parse_api_keys(raw: &str) -> Result<Vec<ApiKeyEntry>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(index, entry)| {
            let mut parts = entry.splitn(3, ':');
            let token = parts.next().map(str::trim).unwrap_or_default();
            let role = parts.next().map(str::trim).unwrap_or_default();
            let owner = parts.next().map(str::trim).unwrap_or_default();

            if token.is_empty() || token.contains(char::is_whitespace) || role.is_empty() {
                return Err(ConfigError::MalformedApiKey { index });
            }
            let role: Role = role.parse().map_err(|_| ConfigError::UnknownRole {
                index,
                role: role.to_string(),
            })?;

            Ok(ApiKeyEntry {
                token: token.to_string(),
                record: CredentialRecord::new(role.as_str(), owner),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_url, None);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup(&[
            (BIND_ENV, "127.0.0.1:9000"),
            (DATABASE_URL_ENV, "postgres://u:p@db/roster"),
            (API_KEYS_ENV, "adm:admin; mgr:manager:M1 ;emp:employee"),
        ]))
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.database_url.as_deref(), Some("postgres://u:p@db/roster"));

        let keys: Vec<(&str, &str, &str)> = config
            .api_keys
            .iter()
            .map(|k| (k.token.as_str(), k.record.role.as_str(), k.record.owner_key.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("adm", "admin", ""), ("mgr", "manager", "M1"), ("emp", "employee", "")]
        );
    }

    #[test]
    fn empty_database_url_means_in_memory() {
        let config = AppConfig::from_lookup(lookup(&[(DATABASE_URL_ENV, "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(BIND_ENV, "localhost")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidBind { value: "localhost".to_string() });
    }

    #[test]
    fn api_key_entries_are_validated() {
        assert_eq!(
            parse_api_keys("good:admin;nocolon").unwrap_err(),
            ConfigError::MalformedApiKey { index: 1 }
        );
        assert_eq!(
            parse_api_keys(":admin").unwrap_err(),
            ConfigError::MalformedApiKey { index: 0 }
        );
        assert_eq!(
            parse_api_keys("k:Admin").unwrap_err(),
            ConfigError::UnknownRole { index: 0, role: "Admin".to_string() }
        );
        assert!(parse_api_keys(" ; ;").unwrap().is_empty());
    }

    #[test]
    fn errors_and_debug_never_show_tokens() {
        let err = parse_api_keys("s3cret:root").unwrap_err();
        assert!(!err.to_string().contains("s3cret"));

        let entries = parse_api_keys("s3cret:admin").unwrap();
        assert!(!format!("{entries:?}").contains("s3cret"));
    }
}
