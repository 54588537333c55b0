use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::collector::{NamedCollector, ScrapeContext};
use crate::metrics::{self, ConstGauge, Desc};

/// Capacity of the per-scrape sink channel.
const SINK_CAPACITY: usize = 64;

/// Runs every enabled collector on each scrape and gathers their observations.
pub struct Exporter {
    collectors: Vec<NamedCollector>,
    scrape_timeout: Duration,
    success: Arc<Desc>,
    duration: Arc<Desc>,
}

impl Exporter {
    /// Creates an exporter over `collectors`, each invoked with a deadline of
    /// `scrape_timeout` per scrape.
    ///
    /// # Errors
    ///
    /// Returns an error if `namespace` does not yield valid metric names.
    pub fn new(
        namespace: &str,
        scrape_timeout: Duration,
        collectors: Vec<NamedCollector>,
    ) -> metrics::Result<Self> {
        let success = metrics::new_desc(
            metrics::build_fq_name(namespace, "exporter", "collector_success"),
            "Whether the collector succeeded during the last scrape",
            &["collector"],
        )?;
        let duration = metrics::new_desc(
            metrics::build_fq_name(namespace, "exporter", "collector_duration_seconds"),
            "Duration of the collector during the last scrape",
            &["collector"],
        )?;

        Ok(Self {
            collectors,
            scrape_timeout,
            success,
            duration,
        })
    }

    /// Names of the collectors in invocation order.
    pub fn collector_names(&self) -> impl Iterator<Item = &str> {
        self.collectors.iter().map(|c| c.name.as_str())
    }

    /// Invokes every collector once and returns all observations of this scrape.
    ///
    /// A failing collector contributes no observations of its own, only its
    /// `collector_success` gauge set to `0`. The remaining collectors still run.
    pub async fn scrape(&self) -> Vec<ConstGauge> {
        let (tx, mut rx) = mpsc::channel::<ConstGauge>(SINK_CAPACITY);
        let drain = tokio::spawn(async move {
            let mut out = Vec::new();
            while let Some(gauge) = rx.recv().await {
                out.push(gauge);
            }
            out
        });

        let mut status = Vec::with_capacity(self.collectors.len() * 2);
        for named in &self.collectors {
            let ctx = ScrapeContext::with_timeout(self.scrape_timeout);
            let before = Instant::now();
            let result = named.collector.collect(&ctx, &tx).await;
            let took = before.elapsed();
            log::trace!(
                "collector `{}` took {} microseconds",
                named.name,
                took.as_micros()
            );

            let success = match result {
                Ok(()) => 1.0,
                Err(err) => {
                    log::error!("collector `{}` failed: {}", named.name, err);
                    0.0
                }
            };
            status.extend(self.status_gauges(&named.name, success, took));
        }
        drop(tx);

        let mut out = match drain.await {
            Ok(out) => out,
            Err(err) => {
                log::error!("metric sink drain task failed: {err}");
                Vec::new()
            }
        };
        out.extend(status);
        out
    }

    fn status_gauges(&self, name: &str, success: f64, took: Duration) -> Vec<ConstGauge> {
        [
            ConstGauge::new(&self.success, success, &[name]),
            ConstGauge::new(&self.duration, took.as_secs_f64(), &[name]),
        ]
        .into_iter()
        .filter_map(|gauge| match gauge {
            Ok(gauge) => Some(gauge),
            Err(err) => {
                log::error!("failed to build status metric for `{name}`: {err}");
                None
            }
        })
        .collect()
    }
}
