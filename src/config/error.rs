/// Errors that may occur while reading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid socket address in `{key}`: '{value}': {source}")]
    InvalidAddress {
        key: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid number of seconds in `{key}`: '{value}': {source}")]
    InvalidSeconds {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("`{key}` must be greater than zero")]
    Zero { key: &'static str },
    #[error("`{key}` does not name any collector")]
    NoCollectors { key: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
