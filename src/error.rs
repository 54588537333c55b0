pub trait ResultLogExt<T, E> {
    /// Logs the error with `context` at error level and discards it.
    fn log_err(self, context: &str) -> Option<T>;
}

impl<T, E> ResultLogExt<T, E> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn log_err(self, context: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
