use super::Error;

/// Error raised by a cache decorator or by invalid cache configuration.
#[derive(Debug)]
pub(super) struct CacheError {
    cache: Box<str>,
    message: Box<str>,
}

impl std::error::Error for CacheError {}

impl core::fmt::Display for CacheError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cache `{}`: {}", self.cache, self.message)
    }
}

impl Error {
    /// Creates a cache error.
    pub fn cache(cache: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Cache(CacheError {
            cache: cache.into().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a cache error.
    pub fn is_cache(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Cache(_))
    }
}
