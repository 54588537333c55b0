use std::time::Duration;

use crate::{connections, metrics};

/// Errors returned by collectors and by the collector registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Metrics(#[from] metrics::Error),
    #[error("connection enumeration timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to enumerate TCP connections: {0}")]
    Enumeration(#[from] connections::Error),
    #[error("connection enumeration task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("metric sink closed")]
    SinkClosed,
    #[error("unknown collector `{0}`")]
    UnknownCollector(String),
}

pub type Result<T> = std::result::Result<T, Error>;
