//! Process configuration read from environment variables.
//!
//! | variable              | default        |
//! |-----------------------|----------------|
//! | `LISTEN_ADDR`         | `0.0.0.0:9182` |
//! | `METRICS_NAMESPACE`   | `connstat`     |
//! | `ENABLED_COLLECTORS`  | `tcp_local`    |
//! | `PROCFS_PATH`         | `/proc`        |
//! | `SCRAPE_TIMEOUT_SECS` | `5`            |
//!
//! Unset and empty variables fall back to their defaults.
mod error;

pub use error::{Error, Result};

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::collector::CollectorSettings;

const LISTEN_ADDR: &str = "LISTEN_ADDR";
const METRICS_NAMESPACE: &str = "METRICS_NAMESPACE";
const ENABLED_COLLECTORS: &str = "ENABLED_COLLECTORS";
const PROCFS_PATH: &str = "PROCFS_PATH";
const SCRAPE_TIMEOUT_SECS: &str = "SCRAPE_TIMEOUT_SECS";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9182";
const DEFAULT_NAMESPACE: &str = "connstat";
const DEFAULT_COLLECTORS: &str = "tcp_local";
const DEFAULT_PROCFS_PATH: &str = "/proc";
const DEFAULT_SCRAPE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the exposition endpoint binds to.
    pub listen_addr: SocketAddr,
    /// Metric name prefix.
    pub namespace: String,
    /// Collectors to run on every scrape, in order.
    pub collectors: Vec<String>,
    /// Root of the procfs tree, e.g. `/host/proc/1` to read the host's network namespace.
    pub procfs_root: PathBuf,
    /// Deadline of each collector invocation.
    pub scrape_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] naming the offending variable if a value cannot be parsed,
    /// the timeout is zero, or the collector list is empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let listen_addr = get(LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .map_err(|source| Error::InvalidAddress {
                key: LISTEN_ADDR,
                value: listen_addr.clone(),
                source,
            })?;

        let scrape_timeout = match get(SCRAPE_TIMEOUT_SECS) {
            Some(value) => value.parse::<u64>().map_err(|source| Error::InvalidSeconds {
                key: SCRAPE_TIMEOUT_SECS,
                value: value.clone(),
                source,
            })?,
            None => DEFAULT_SCRAPE_TIMEOUT_SECS,
        };
        if scrape_timeout == 0 {
            return Err(Error::Zero {
                key: SCRAPE_TIMEOUT_SECS,
            });
        }

        let collectors: Vec<String> = get(ENABLED_COLLECTORS)
            .unwrap_or_else(|| DEFAULT_COLLECTORS.to_owned())
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        if collectors.is_empty() {
            return Err(Error::NoCollectors {
                key: ENABLED_COLLECTORS,
            });
        }

        Ok(Self {
            listen_addr,
            namespace: get(METRICS_NAMESPACE).unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned()),
            collectors,
            procfs_root: get(PROCFS_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROCFS_PATH)),
            scrape_timeout: Duration::from_secs(scrape_timeout),
        })
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            namespace: self.namespace.clone(),
            procfs_root: self.procfs_root.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9182".parse().unwrap());
        assert_eq!(config.namespace, "connstat");
        assert_eq!(config.collectors, vec!["tcp_local"]);
        assert_eq!(config.procfs_root, PathBuf::from("/proc"));
        assert_eq!(config.scrape_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("METRICS_NAMESPACE", "windows"),
            ("ENABLED_COLLECTORS", " tcp_local , other ,"),
            ("PROCFS_PATH", "/host/proc/1"),
            ("SCRAPE_TIMEOUT_SECS", "2"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.namespace, "windows");
        assert_eq!(config.collectors, vec!["tcp_local", "other"]);
        assert_eq!(config.scrape_timeout, Duration::from_secs(2));

        let settings = config.collector_settings();
        assert_eq!(settings.namespace, "windows");
        assert_eq!(settings.procfs_root, PathBuf::from("/host/proc/1"));
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let config = from_vars(&[("METRICS_NAMESPACE", "  "), ("LISTEN_ADDR", "")]).unwrap();
        assert_eq!(config.namespace, "connstat");
        assert_eq!(config.listen_addr.port(), 9182);
    }

    #[test]
    fn test_invalid_listen_addr() {
        let err = from_vars(&[("LISTEN_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { key: "LISTEN_ADDR", .. }));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = from_vars(&[("SCRAPE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(err, Error::InvalidSeconds { .. }));

        let err = from_vars(&[("SCRAPE_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, Error::Zero { .. }));
    }

    #[test]
    fn test_no_collectors() {
        let err = from_vars(&[("ENABLED_COLLECTORS", ", ,")]).unwrap_err();
        assert!(matches!(err, Error::NoCollectors { .. }));
    }
}
