use std::sync::Arc;

use super::{Desc, Error, Result};

/// An immutable gauge observation: one value for one label combination of a [`Desc`].
#[derive(Debug, Clone)]
pub struct ConstGauge {
    desc: Arc<Desc>,
    value: f64,
    label_values: Vec<String>,
}

impl ConstGauge {
    /// Creates a gauge sample for `desc`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LabelCardinality`] if the number of label values does not
    /// match the descriptor's variable labels.
    pub fn new(desc: &Arc<Desc>, value: f64, label_values: &[&str]) -> Result<Self> {
        if label_values.len() != desc.variable_labels.len() {
            return Err(Error::LabelCardinality {
                name: desc.fq_name.clone(),
                expected: desc.variable_labels.len(),
                got: label_values.len(),
            });
        }

        Ok(Self {
            desc: Arc::clone(desc),
            value,
            label_values: label_values.iter().map(|v| (*v).to_owned()).collect(),
        })
    }

    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Returns the value of the variable label `name`, if the descriptor has it.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .variable_labels
            .iter()
            .position(|l| l == name)
            .map(|idx| self.label_values[idx].as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::new_desc;

    #[test]
    fn test_const_gauge_labels() {
        let desc = new_desc("x_tcp_connections".into(), "help", &["af", "state"]).unwrap();
        let gauge = ConstGauge::new(&desc, 3.0, &["ipv6", "listening"]).unwrap();
        assert_eq!(gauge.value(), 3.0);
        assert_eq!(gauge.label("af"), Some("ipv6"));
        assert_eq!(gauge.label("state"), Some("listening"));
        assert_eq!(gauge.label("missing"), None);
        assert_eq!(gauge.desc().fq_name, "x_tcp_connections");
    }

    #[test]
    fn test_const_gauge_label_cardinality() {
        let desc = new_desc("x_tcp_connections".into(), "help", &["af", "state"]).unwrap();
        let err = ConstGauge::new(&desc, 1.0, &["ipv4"]).unwrap_err();
        assert!(matches!(
            err,
            Error::LabelCardinality {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }
}
