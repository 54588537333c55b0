use std::borrow::Cow;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::fsutil;

use super::{AF_INET, AF_INET6, Connection, ConnectionSource, Error, Result};

/// Minimum number of whitespace-separated fields in a connection line:
/// `sl local_address rem_address st`.
const MIN_FIELDS: usize = 4;

/// Reads the kernel TCP tables `net/tcp` and `net/tcp6` below a procfs root.
///
/// The tables are per network namespace. Pointing the root at
/// `/proc/<pid>` reads the namespace of that process instead of the caller's.
#[derive(Debug, Clone)]
pub struct ProcNetTcp {
    tcp_path: PathBuf,
    tcp6_path: PathBuf,
}

impl ProcNetTcp {
    /// Creates a source reading `<procfs_root>/net/tcp` and `<procfs_root>/net/tcp6`.
    pub fn new(procfs_root: impl AsRef<Path>) -> Self {
        let root = procfs_root.as_ref();
        Self {
            tcp_path: root.join("net/tcp"),
            tcp6_path: root.join("net/tcp6"),
        }
    }
}

impl Default for ProcNetTcp {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ConnectionSource for ProcNetTcp {
    /// Reads both tables.
    ///
    /// # Errors
    ///
    /// Fails if `net/tcp` is missing or unreadable, or if `net/tcp6` exists but
    /// cannot be read. A missing `net/tcp6` means IPv6 is disabled and yields no
    /// IPv6 connections.
    fn connections(&self) -> Result<Vec<Connection>> {
        let mut out = Vec::new();

        let mut tcp = fsutil::open_file_reader(&self.tcp_path)?;
        read_table(&mut tcp, AF_INET, &self.tcp_path, &mut out)?;

        match fsutil::open_optional_file_reader(&self.tcp6_path)? {
            Some(mut tcp6) => read_table(&mut tcp6, AF_INET6, &self.tcp6_path, &mut out)?,
            None => log::debug!(
                "`{}` not present, skipping IPv6 connections",
                self.tcp6_path.display()
            ),
        }

        Ok(out)
    }
}

/// Parses one kernel TCP table and appends a [`Connection`] per entry to `out`.
///
/// The first line is a column header. Lines with fewer than four fields are
/// skipped.
fn read_table<R: BufRead>(
    buf: &mut R,
    family: u32,
    path: &Path,
    out: &mut Vec<Connection>,
) -> Result<()> {
    let mut line = String::with_capacity(160);
    let mut lineno = 0usize;

    while buf.read_line(&mut line).map_err(|source| Error::ReadLine {
        path: path.to_path_buf(),
        source,
    })? != 0
    {
        lineno += 1;
        if lineno > 1 {
            match parse_state_field(&line) {
                Some(code) => out.push(Connection::new(family, kernel_state_name(code))),
                None => log::debug!(
                    "skipping malformed line {} in `{}`: {:?}",
                    lineno,
                    path.display(),
                    line.trim_end()
                ),
            }
        }
        line.clear();
    }

    Ok(())
}

/// Returns the hex state column of a connection line.
fn parse_state_field(line: &str) -> Option<&str> {
    let fields: Vec<&str> = line.split_whitespace().take(MIN_FIELDS).collect();
    if fields.len() < MIN_FIELDS || !fields[0].ends_with(':') {
        return None;
    }
    Some(fields[3])
}

/// Translates a kernel TCP state code (`include/net/tcp_states.h`) into the
/// connection-table state name.
fn kernel_state_name(code: &str) -> Cow<'static, str> {
    let name = match u8::from_str_radix(code, 16) {
        Ok(0x01) => "ESTABLISHED",
        Ok(0x02) => "SYN_SENT",
        Ok(0x03) => "SYN_RECEIVED",
        Ok(0x04) => "FIN_WAIT1",
        Ok(0x05) => "FIN_WAIT2",
        Ok(0x06) => "TIME_WAIT",
        Ok(0x07) => "CLOSED",
        Ok(0x08) => "CLOSE_WAIT",
        Ok(0x09) => "LAST_ACK",
        Ok(0x0A) => "LISTEN",
        Ok(0x0B) => "CLOSING",
        Ok(0x0C) => "NEW_SYN_RECV",
        _ => return Cow::Owned(format!("UNKNOWN({code})")),
    };
    Cow::Borrowed(name)
}
