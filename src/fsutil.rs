use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

/// Error that occurs when opening a file fails.
#[derive(Debug, thiserror::Error)]
#[error("failed to open file `{path}`: {source}")]
pub struct FileOpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Opens a file at the given path and wraps it in a [`BufReader`].
///
/// # Errors
///
/// Returns a [`FileOpenError`] if the file cannot be opened.
///
/// # Example
/// ```no_run
/// # use connstat_exporter::fsutil;
/// let reader = fsutil::open_file_reader("/proc/net/tcp")?;
/// # Ok::<(), fsutil::FileOpenError>(())
/// ```
pub fn open_file_reader(path: impl AsRef<Path>) -> Result<BufReader<File>, FileOpenError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| FileOpenError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Like [`open_file_reader`], but a missing file yields `Ok(None)`.
///
/// Kernel tables such as `net/tcp6` only exist when the matching protocol is enabled.
///
/// # Errors
///
/// Returns a [`FileOpenError`] for every failure other than [`io::ErrorKind::NotFound`].
pub fn open_optional_file_reader(
    path: impl AsRef<Path>,
) -> Result<Option<BufReader<File>>, FileOpenError> {
    match open_file_reader(path) {
        Ok(reader) => Ok(Some(reader)),
        Err(err) if err.source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_open_file_reader_success() {
        let tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        let reader = open_file_reader(tmp.path()).expect("should open test file");
        let metadata = reader.get_ref().metadata().unwrap();
        assert!(metadata.is_file());
    }

    #[test]
    fn test_open_file_reader_error() {
        let err = open_file_reader("/definitely/does/not/exist").unwrap_err();
        assert_eq!(err.path, PathBuf::from("/definitely/does/not/exist"));
        assert_eq!(err.source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_open_optional_file_reader_missing() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let reader = open_optional_file_reader(dir.path().join("tcp6")).unwrap();
        assert!(reader.is_none());
    }

    #[test]
    fn test_open_optional_file_reader_present() {
        let tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        let reader = open_optional_file_reader(tmp.path()).unwrap();
        assert!(reader.is_some());
    }
}
