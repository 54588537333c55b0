use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Collector, Error, Result, tcp_local};

/// Settings shared by every collector factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Metric name prefix, e.g. `connstat`.
    pub namespace: String,
    /// Root of the procfs tree to read kernel tables from.
    pub procfs_root: PathBuf,
}

/// Builds a ready collector or fails with a construction error.
pub type Factory = fn(&CollectorSettings) -> Result<Box<dyn Collector>>;

/// A constructed collector together with the name it was registered under.
pub struct NamedCollector {
    pub name: String,
    pub collector: Box<dyn Collector>,
}

/// Table of collector factories keyed by name.
#[derive(Debug, Default)]
pub struct CollectorRegistry {
    factories: BTreeMap<&'static str, Factory>,
}

impl CollectorRegistry {
    /// Returns a registry containing every collector shipped with this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(tcp_local::NAME, tcp_local::factory);
        registry
    }

    /// Adds `factory` under `name`, replacing an existing entry.
    pub fn register(&mut self, name: &'static str, factory: Factory) -> &mut Self {
        if self.factories.insert(name, factory).is_some() {
            log::warn!("collector `{name}` registered twice, keeping the last factory");
        }
        self
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Constructs the collectors named in `names`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCollector`] for a name without a factory, or the
    /// first construction error of a factory.
    pub fn build(
        &self,
        names: &[String],
        settings: &CollectorSettings,
    ) -> Result<Vec<NamedCollector>> {
        names
            .iter()
            .map(|name| {
                let factory = self
                    .factories
                    .get(name.as_str())
                    .ok_or_else(|| Error::UnknownCollector(name.clone()))?;
                let collector = factory(settings)?;
                log::debug!("built collector `{name}`");
                Ok(NamedCollector {
                    name: name.clone(),
                    collector,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MetricSink, ScrapeContext};

    struct Noop;

    #[async_trait::async_trait]
    impl Collector for Noop {
        async fn collect(&self, _ctx: &ScrapeContext, _sink: &MetricSink) -> Result<()> {
            Ok(())
        }
    }

    fn noop_factory(_: &CollectorSettings) -> Result<Box<dyn Collector>> {
        Ok(Box::new(Noop))
    }

    fn settings(namespace: &str) -> CollectorSettings {
        CollectorSettings {
            namespace: namespace.to_owned(),
            procfs_root: PathBuf::from("/proc"),
        }
    }

    #[test]
    fn test_builtin_contains_tcp_local() {
        let registry = CollectorRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["tcp_local"]);
    }

    #[test]
    fn test_build_known_collectors_in_order() {
        let mut registry = CollectorRegistry::builtin();
        registry.register("noop", noop_factory);

        let names = vec!["tcp_local".to_owned(), "noop".to_owned()];
        let built = registry.build(&names, &settings("connstat")).unwrap();
        let built: Vec<_> = built.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(built, vec!["tcp_local", "noop"]);
    }

    #[test]
    fn test_build_unknown_collector() {
        let registry = CollectorRegistry::builtin();
        let err = registry
            .build(&["tcp_remote".to_owned()], &settings("connstat"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownCollector(name) if name == "tcp_remote"));
    }

    #[test]
    fn test_build_propagates_construction_error() {
        let registry = CollectorRegistry::builtin();
        let err = registry
            .build(&["tcp_local".to_owned()], &settings("not valid"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Metrics(_)));
    }
}
