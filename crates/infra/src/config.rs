//! Configuration loading and representation.
//!
//! Everything comes from environment variables; `from_lookup` takes the lookup as a
//! closure so tests never touch the process environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Where records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    InMemory,
    Postgres { database_url: String },
}

/// Page-number pagination settings shared by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub persistence: Persistence,
    pub pagination: PaginationConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup` (variable name → value).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("QUIZDESK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "QUIZDESK_BIND",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(raw) => raw.trim().parse::<bool>().map_err(|e| ConfigError::Invalid {
                var: "USE_PERSISTENT_STORES",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
        };

        let persistence = if persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            Persistence::Postgres { database_url }
        } else {
            Persistence::InMemory
        };

        let page_size = positive(&lookup, "QUIZDESK_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let max_page_size = positive(&lookup, "QUIZDESK_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        if page_size > max_page_size {
            return Err(ConfigError::Invalid {
                var: "QUIZDESK_PAGE_SIZE",
                value: page_size.to_string(),
                reason: format!("exceeds QUIZDESK_MAX_PAGE_SIZE ({max_page_size})"),
            });
        }

        Ok(Self {
            bind_addr,
            persistence,
            pagination: PaginationConfig {
                page_size,
                max_page_size,
            },
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            persistence: Persistence::InMemory,
            pagination: PaginationConfig::default(),
        }
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn persistent_mode_requires_database_url() {
        let err = AppConfig::from_lookup(lookup_from(&[("USE_PERSISTENT_STORES", "true")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/quizdesk"),
        ]))
        .unwrap();
        assert_eq!(
            config.persistence,
            Persistence::Postgres {
                database_url: "postgres://localhost/quizdesk".to_string()
            }
        );
    }

    #[test]
    fn malformed_values_are_reported_by_variable() {
        let err = AppConfig::from_lookup(lookup_from(&[("QUIZDESK_BIND", "nowhere")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "QUIZDESK_BIND", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[("QUIZDESK_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "QUIZDESK_PAGE_SIZE", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[("USE_PERSISTENT_STORES", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "USE_PERSISTENT_STORES", .. }));
    }

    #[test]
    fn page_size_may_not_exceed_the_cap() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("QUIZDESK_PAGE_SIZE", "50"),
            ("QUIZDESK_MAX_PAGE_SIZE", "20"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "QUIZDESK_PAGE_SIZE", .. }));
    }
}
