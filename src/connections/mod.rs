//! Enumeration of the local TCP connection table.
//!
//! A [`ConnectionSource`] produces a snapshot of [`Connection`] records, each
//! carrying the raw address family code and the raw state name as reported by
//! the operating system. No classification happens here; the records are
//! handed to collectors untouched.
//!
//! # Key Components
//!
//! - [`Connection`] — one entry of the connection table.
//! - [`ConnectionSource`] — the blocking enumeration primitive.
//! - [`ProcNetTcp`] — reads `net/tcp` and `net/tcp6` below a procfs root.
mod error;
mod procfs;

pub use error::{Error, Result};
pub use procfs::ProcNetTcp;

/// Address family code of IPv4 sockets.
pub const AF_INET: u32 = libc::AF_INET as u32;
/// Address family code of IPv6 sockets.
pub const AF_INET6: u32 = libc::AF_INET6 as u32;

/// A single TCP connection as reported by the connection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Raw address family code, e.g. [`AF_INET`] or [`AF_INET6`].
    pub family: u32,
    /// Raw state name, e.g. `ESTABLISHED` or `LISTEN`.
    pub status: String,
}

impl Connection {
    pub fn new(family: u32, status: impl Into<String>) -> Self {
        Self {
            family,
            status: status.into(),
        }
    }
}

/// Blocking access to the TCP connection table of the local host.
///
/// Implementations must return the complete table or an error, never a partial
/// list. Callers run this off the async executor.
pub trait ConnectionSource: Send + Sync {
    /// Returns every TCP connection currently known to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the table cannot be read.
    fn connections(&self) -> Result<Vec<Connection>>;
}
