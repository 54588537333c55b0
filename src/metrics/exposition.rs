use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use super::{ConstGauge, Result};

/// Content type of the text exposition format.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Encodes the samples of one scrape in the Prometheus text format.
///
/// Samples are grouped by descriptor name into a registry that lives only for
/// this call. A label combination emitted twice keeps the last value.
/// Descriptors sharing a name must share their label names: the first
/// descriptor seen defines the family, and a sample with a different number
/// of labels fails the whole encoding.
///
/// # Errors
///
/// Returns an error if a sample does not fit its descriptor or encoding fails.
pub fn encode(samples: &[ConstGauge]) -> Result<String> {
    let registry = Registry::new();
    let mut families: BTreeMap<&str, GaugeVec> = BTreeMap::new();

    for sample in samples {
        let desc = sample.desc();
        let family = match families.entry(desc.fq_name.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let labels: Vec<&str> = desc.variable_labels.iter().map(String::as_str).collect();
                let gauge_vec =
                    GaugeVec::new(Opts::new(desc.fq_name.clone(), desc.help.clone()), &labels)?;
                registry.register(Box::new(gauge_vec.clone()))?;
                entry.insert(gauge_vec)
            }
        };

        let values: Vec<&str> = sample.label_values().iter().map(String::as_str).collect();
        family
            .get_metric_with_label_values(&values)?
            .set(sample.value());
    }

    let mut buf = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::new_desc;

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[]).unwrap(), "");
    }

    #[test]
    fn test_encode_only_emitted_pairs() {
        let desc = new_desc(
            "connstat_tcp_connections".into(),
            "Number of TCP Connections per state",
            &["af", "state"],
        )
        .unwrap();
        let samples = vec![
            ConstGauge::new(&desc, 2.0, &["ipv4", "established"]).unwrap(),
            ConstGauge::new(&desc, 1.0, &["ipv6", "listening"]).unwrap(),
        ];

        let text = encode(&samples).unwrap();
        assert!(text.contains(
            "# HELP connstat_tcp_connections Number of TCP Connections per state\n"
        ));
        assert!(text.contains("# TYPE connstat_tcp_connections gauge\n"));
        assert!(text.contains("connstat_tcp_connections{af=\"ipv4\",state=\"established\"} 2\n"));
        assert!(text.contains("connstat_tcp_connections{af=\"ipv6\",state=\"listening\"} 1\n"));
        assert!(!text.contains("state=\"closing\""));
        assert!(!text.contains("af=\"ipv6\",state=\"established\""));
    }

    #[test]
    fn test_encode_conflicting_label_sets() {
        let narrow = new_desc("shared_metric".into(), "help", &["af"]).unwrap();
        let wide = new_desc("shared_metric".into(), "help", &["af", "state"]).unwrap();
        let samples = vec![
            ConstGauge::new(&narrow, 1.0, &["ipv4"]).unwrap(),
            ConstGauge::new(&wide, 2.0, &["ipv4", "listening"]).unwrap(),
        ];

        assert!(encode(&samples).is_err());
    }

    #[test]
    fn test_encode_multiple_families() {
        let a = new_desc("a_metric".into(), "a", &["collector"]).unwrap();
        let b = new_desc("b_metric".into(), "b", &["collector"]).unwrap();
        let samples = vec![
            ConstGauge::new(&a, 1.0, &["tcp_local"]).unwrap(),
            ConstGauge::new(&b, 0.5, &["tcp_local"]).unwrap(),
        ];

        let text = encode(&samples).unwrap();
        assert!(text.contains("a_metric{collector=\"tcp_local\"} 1\n"));
        assert!(text.contains("b_metric{collector=\"tcp_local\"} 0.5\n"));
    }
}
