use super::Error;

/// Error when a blocking cache could not hand out the per-key lock before the
/// configured timeout expired.
#[derive(Debug)]
pub(super) struct LockTimeout {
    cache: Box<str>,
    key: Box<str>,
    timeout_ms: u64,
}

impl std::error::Error for LockTimeout {}

impl core::fmt::Display for LockTimeout {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "could not acquire lock for key `{}` on cache `{}` within {}ms",
            self.key, self.cache, self.timeout_ms
        )
    }
}

impl Error {
    /// Creates a lock timeout error.
    pub fn lock_timeout(cache: impl Into<String>, key: impl Into<String>, timeout_ms: u64) -> Error {
        Error::from(super::ErrorKind::LockTimeout(LockTimeout {
            cache: cache.into().into(),
            key: key.into().into(),
            timeout_ms,
        }))
    }

    /// Returns `true` if this error is a lock timeout error.
    pub fn is_lock_timeout(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::LockTimeout(_))
    }

    /// Returns `true` if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        self.any(|err| err.is_lock_timeout())
    }
}
