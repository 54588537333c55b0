//! The `tcp_local` collector: TCP connection counts per address family and state.
//!
//! Each invocation enumerates the connection table once, classifies every entry
//! and emits one `<namespace>_tcp_connections{af, state}` gauge per combination
//! that occurred at least once. Combinations without connections are not emitted.
//!
//! # Classification
//!
//! | raw state                                                               | `state`     |
//! |-------------------------------------------------------------------------|-------------|
//! | `ESTABLISHED`                                                           | established |
//! | `SYN_SENT`, `SYN_RECEIVED`                                              | opening     |
//! | `FIN_WAIT1`, `FIN_WAIT2`, `CLOSED`, `CLOSE_WAIT`, `LAST_ACK`, `CLOSING`, `DELETE` | closing |
//! | `TIME_WAIT`                                                             | time_wait   |
//! | `LISTEN`                                                                | listening   |
//!
//! Any other raw state is left out of the tally. Address family `AF_INET6` maps
//! to `ipv6`; every other family code is counted as `ipv4`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::connections::{AF_INET6, Connection, ConnectionSource, ProcNetTcp};
use crate::metrics::{self, ConstGauge, Desc};

use super::{Collector, CollectorSettings, Error, MetricSink, Result, ScrapeContext};

pub(super) const NAME: &str = "tcp_local";
const SUBSYSTEM: &str = "tcp";
const ENUMERATION_TIMEOUT: Duration = Duration::from_secs(1);

/// Normalized TCP connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TcpState {
    Established,
    Opening,
    Closing,
    TimeWait,
    Listening,
}

static STATE_MAPPING: LazyLock<HashMap<&'static str, TcpState>> = LazyLock::new(|| {
    let mut m = HashMap::with_capacity(12);

    m.insert("ESTABLISHED", TcpState::Established);
    m.insert("SYN_SENT", TcpState::Opening);
    m.insert("SYN_RECEIVED", TcpState::Opening);
    m.insert("FIN_WAIT1", TcpState::Closing);
    m.insert("FIN_WAIT2", TcpState::Closing);
    m.insert("TIME_WAIT", TcpState::TimeWait);
    m.insert("CLOSED", TcpState::Closing);
    m.insert("CLOSE_WAIT", TcpState::Closing);
    m.insert("LAST_ACK", TcpState::Closing);
    m.insert("LISTEN", TcpState::Listening);
    m.insert("CLOSING", TcpState::Closing);
    m.insert("DELETE", TcpState::Closing);

    m
});

impl TcpState {
    /// Looks up the normalized state of a raw state name. Unknown names yield `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        STATE_MAPPING.get(raw).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TcpState::Established => "established",
            TcpState::Opening => "opening",
            TcpState::Closing => "closing",
            TcpState::TimeWait => "time_wait",
            TcpState::Listening => "listening",
        }
    }
}

/// Address family label of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl AddressFamily {
    /// Maps a raw family code to its label. Codes other than `AF_INET6` count as IPv4.
    pub fn classify(code: u32) -> Self {
        if code == AF_INET6 {
            AddressFamily::Ipv6
        } else {
            AddressFamily::Ipv4
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::Ipv4 => "ipv4",
            AddressFamily::Ipv6 => "ipv6",
        }
    }
}

/// Connection counts of a single enumeration, one map per address family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    ipv4: BTreeMap<TcpState, u64>,
    ipv6: BTreeMap<TcpState, u64>,
}

impl Tally {
    /// Classifies and counts `connections`. Connections in unknown states are skipped.
    pub fn from_connections(connections: &[Connection]) -> Self {
        let mut tally = Self::default();

        for con in connections {
            let counts = match AddressFamily::classify(con.family) {
                AddressFamily::Ipv4 => &mut tally.ipv4,
                AddressFamily::Ipv6 => &mut tally.ipv6,
            };

            if let Some(state) = TcpState::classify(&con.status) {
                *counts.entry(state).or_insert(0) += 1;
            }
        }

        tally
    }

    /// Returns the count of one (family, state) pair, `0` if it never occurred.
    pub fn get(&self, family: AddressFamily, state: TcpState) -> u64 {
        let counts = match family {
            AddressFamily::Ipv4 => &self.ipv4,
            AddressFamily::Ipv6 => &self.ipv6,
        };
        counts.get(&state).copied().unwrap_or(0)
    }

    /// Iterates over the pairs that occurred, IPv4 first.
    pub fn iter(&self) -> impl Iterator<Item = (AddressFamily, TcpState, u64)> + '_ {
        let ipv4 = self
            .ipv4
            .iter()
            .map(|(state, count)| (AddressFamily::Ipv4, *state, *count));
        let ipv6 = self
            .ipv6
            .iter()
            .map(|(state, count)| (AddressFamily::Ipv6, *state, *count));
        ipv4.chain(ipv6)
    }

    /// Number of classified connections.
    pub fn total(&self) -> u64 {
        self.ipv4.values().chain(self.ipv6.values()).sum()
    }
}

/// Reports local TCP connection counts through a [`ConnectionSource`].
#[derive(Debug)]
pub struct TcpLocalCollector<S = ProcNetTcp> {
    connections: Arc<Desc>,
    source: Arc<S>,
}

impl<S> TcpLocalCollector<S>
where
    S: ConnectionSource + 'static,
{
    /// Declares the `<namespace>_tcp_connections` descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Metrics`] if `namespace` does not yield a valid metric name.
    pub fn new(namespace: &str, source: S) -> Result<Self> {
        let connections = metrics::new_desc(
            metrics::build_fq_name(namespace, SUBSYSTEM, "connections"),
            "Number of TCP Connections per state",
            &["af", "state"],
        )?;

        Ok(Self {
            connections,
            source: Arc::new(source),
        })
    }

    pub fn desc(&self) -> &Desc {
        &self.connections
    }

    /// Runs the blocking enumeration on the blocking pool, bounded by the child timeout.
    ///
    /// An expired context fails before the enumeration is started. A read that
    /// outlives the timeout cannot be interrupted: it keeps occupying a blocking
    /// pool thread until it returns, and its result is discarded.
    async fn enumerate(&self, ctx: &ScrapeContext) -> Result<Vec<Connection>> {
        let timeout = ctx.child_timeout(ENUMERATION_TIMEOUT);
        if timeout.is_zero() {
            return Err(Error::Timeout(timeout));
        }

        let source = Arc::clone(&self.source);
        let task = tokio::task::spawn_blocking(move || source.connections());

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => Ok(joined??),
            Err(_) => {
                log::warn!(
                    "tcp connection enumeration exceeded {:?}, leaving it to finish on the blocking pool",
                    timeout
                );
                Err(Error::Timeout(timeout))
            }
        }
    }

    async fn collect_connections(&self, ctx: &ScrapeContext, sink: &MetricSink) -> Result<()> {
        let before = std::time::Instant::now();
        let connections = self.enumerate(ctx).await?;
        log::trace!(
            "enumerated {} tcp connections in {} microseconds",
            connections.len(),
            before.elapsed().as_micros()
        );

        let tally = Tally::from_connections(&connections);
        let gauges = tally
            .iter()
            .map(|(family, state, count)| {
                ConstGauge::new(
                    &self.connections,
                    count as f64,
                    &[family.as_str(), state.as_str()],
                )
            })
            .collect::<metrics::Result<Vec<_>>>()?;

        for gauge in gauges {
            sink.send(gauge).await.map_err(|_| Error::SinkClosed)?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl<S> Collector for TcpLocalCollector<S>
where
    S: ConnectionSource + 'static,
{
    async fn collect(&self, ctx: &ScrapeContext, sink: &MetricSink) -> Result<()> {
        if let Err(err) = self.collect_connections(ctx, sink).await {
            log::error!(
                "failed collecting tcp metrics: desc={}, error={}",
                self.connections.fq_name,
                err
            );
            return Err(err);
        }
        Ok(())
    }
}

/// Registry factory: a collector reading the procfs tables below `settings.procfs_root`.
pub(super) fn factory(settings: &CollectorSettings) -> Result<Box<dyn Collector>> {
    let source = ProcNetTcp::new(&settings.procfs_root);
    Ok(Box::new(TcpLocalCollector::new(&settings.namespace, source)?))
}
