/// Errors raised while declaring, emitting or encoding metrics.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid metric descriptor `{name}`: {source}")]
    Descriptor {
        name: String,
        #[source]
        source: prometheus::Error,
    },
    #[error("metric `{name}` expects {expected} label values, got {got}")]
    LabelCardinality {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
    #[error("encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
