//! Pluggable metric collectors invoked once per scrape.
//!
//! A [`Collector`] receives a [`ScrapeContext`] bounding how long it may take
//! and a [`MetricSink`] to write its observations to. Collectors keep no state
//! between invocations; everything they emit is derived from a fresh snapshot.
//!
//! Collectors are looked up by name in a [`CollectorRegistry`], an explicit
//! table of factories built at startup.
//!
//! # Available Collectors
//!
//! - `tcp_local` — TCP connection counts by address family and state
//!   ([`TcpLocalCollector`]).

mod error;
mod registry;
mod tcp_local;

pub use error::{Error, Result};
pub use registry::{CollectorRegistry, CollectorSettings, Factory, NamedCollector};
pub use tcp_local::{AddressFamily, TcpLocalCollector, TcpState, Tally};

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::metrics::ConstGauge;

/// Write side of the channel collectors emit their observations into.
pub type MetricSink = mpsc::Sender<ConstGauge>;

/// Per-scrape context handed to every collector invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapeContext {
    deadline: Option<Instant>,
}

impl ScrapeContext {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self { deadline: None }
    }

    /// A context whose deadline lies `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Derives a child timeout: `limit`, shortened to the time left before the deadline.
    ///
    /// An expired context yields [`Duration::ZERO`].
    pub fn child_timeout(&self, limit: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => limit.min(deadline.saturating_duration_since(Instant::now())),
            None => limit,
        }
    }
}

/// A named source of metrics, invoked by the host on every scrape.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Writes the current observations to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be taken. In that case nothing
    /// has been written to `sink`.
    async fn collect(&self, ctx: &ScrapeContext, sink: &MetricSink) -> Result<()>;
}
