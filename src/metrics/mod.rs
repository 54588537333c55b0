//! Metric descriptors, constant gauge samples and text exposition.
//!
//! Collectors declare a [`Desc`] once at construction and emit [`ConstGauge`]
//! samples bound to it on every scrape. The host turns the samples of one
//! scrape into the Prometheus text format with [`encode`]. Only the label
//! combinations that were actually emitted end up in the output.

mod error;
mod exposition;
mod gauge;

pub use error::{Error, Result};
pub use exposition::{CONTENT_TYPE, encode};
pub use gauge::ConstGauge;
pub use prometheus::core::Desc;

use std::collections::HashMap;
use std::sync::Arc;

/// Joins the non-empty name components with `_`.
///
/// # Examples
///
/// ```
/// # use connstat_exporter::metrics::build_fq_name;
/// assert_eq!(build_fq_name("connstat", "tcp", "connections"), "connstat_tcp_connections");
/// assert_eq!(build_fq_name("", "tcp", "connections"), "tcp_connections");
/// ```
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Declares a metric descriptor with the given variable labels.
///
/// # Errors
///
/// Returns [`Error::Descriptor`] if the name, help text or label names are
/// rejected by the Prometheus naming rules.
pub fn new_desc(fq_name: String, help: &str, variable_labels: &[&str]) -> Result<Arc<Desc>> {
    let labels = variable_labels.iter().map(|l| (*l).to_owned()).collect();
    Desc::new(fq_name.clone(), help.to_owned(), labels, HashMap::new())
        .map(Arc::new)
        .map_err(|source| Error::Descriptor {
            name: fq_name,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fq_name_skips_empty_parts() {
        assert_eq!(build_fq_name("a", "", "c"), "a_c");
        assert_eq!(build_fq_name("", "", "c"), "c");
    }

    #[test]
    fn test_new_desc_valid() {
        let desc = new_desc("connstat_tcp_connections".into(), "help", &["af", "state"]).unwrap();
        assert_eq!(desc.fq_name, "connstat_tcp_connections");
        assert_eq!(desc.variable_labels, vec!["af", "state"]);
    }

    #[test]
    fn test_new_desc_invalid_name() {
        let err = new_desc("bad-name_tcp_connections".into(), "help", &["af"]).unwrap_err();
        assert!(matches!(err, Error::Descriptor { name, .. } if name == "bad-name_tcp_connections"));
    }

    #[test]
    fn test_new_desc_invalid_label() {
        let err = new_desc("ok_name".into(), "help", &["not-a-label"]).unwrap_err();
        assert!(matches!(err, Error::Descriptor { .. }));
    }
}
