mod adhoc;
mod cache;
mod invalid_record_count;
mod invalid_schema;
mod invalid_state;
mod lock_timeout;
mod result_mapping;
mod type_conversion;
mod unknown_column;

use adhoc::AdhocError;
use cache::CacheError;
use invalid_record_count::InvalidRecordCount;
use invalid_schema::InvalidSchema;
use invalid_state::InvalidState;
use lock_timeout::LockTimeout;
use result_mapping::ResultMappingError;
use std::sync::Arc;
use type_conversion::TypeConversionError;
use unknown_column::UnknownColumn;

/// Returns early with an ad-hoc error built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while mapping rows or accessing a cache.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context is shown first,
    /// followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let ErrorInner { kind, cause } = match consequent.inner {
            Some(inner) => Arc::try_unwrap(inner).unwrap_or_else(|shared| ErrorInner {
                kind: ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
                cause: shared.cause.clone(),
            }),
            None => ErrorInner {
                kind: ErrorKind::Unknown,
                cause: None,
            },
        };

        debug_assert!(
            cause.is_none(),
            "consequent error must not already have a cause"
        );

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Creates an ad-hoc error from format arguments. Prefer the `err!` and
    /// `bail!` macros.
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    /// Returns the innermost error of the context chain.
    pub fn root(&self) -> &Error {
        self.chain().last().unwrap_or(self)
    }

    fn chain(&self) -> impl Iterator<Item = &Error> {
        let mut err = self;
        core::iter::once(err).chain(core::iter::from_fn(move || {
            err = err.inner.as_ref().and_then(|inner| inner.cause.as_ref())?;
            Some(err)
        }))
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }

    /// Returns `true` if any error in the context chain satisfies `f`.
    pub fn any(&self, f: impl Fn(&Error) -> bool) -> bool {
        self.chain().any(f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => self
                .inner
                .as_ref()
                .and_then(|inner| inner.cause.as_ref())
                .map(|cause| cause as &(dyn std::error::Error + 'static)),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut it = self.chain().peekable();
        while let Some(err) = it.next() {
            core::fmt::Display::fmt(err.kind(), f)?;
            if it.peek().is_some() {
                f.write_str(": ")?;
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            core::fmt::Display::fmt(self, f)
        } else {
            let Some(ref inner) = self.inner else {
                return f.debug_struct("Error").field("kind", &"None").finish();
            };
            f.debug_struct("Error")
                .field("kind", &inner.kind)
                .field("cause", &inner.cause)
                .finish()
        }
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Cache(CacheError),
    InvalidSchema(InvalidSchema),
    UnknownColumn(UnknownColumn),
    TypeConversion(TypeConversionError),
    ResultMapping(ResultMappingError),
    InvalidRecordCount(InvalidRecordCount),
    LockTimeout(LockTimeout),
    InvalidState(InvalidState),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Cache(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            UnknownColumn(err) => core::fmt::Display::fmt(err, f),
            TypeConversion(err) => core::fmt::Display::fmt(err, f),
            ResultMapping(err) => core::fmt::Display::fmt(err, f),
            InvalidRecordCount(err) => core::fmt::Display::fmt(err, f),
            LockTimeout(err) => core::fmt::Display::fmt(err, f),
            InvalidState(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown rowmap error"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Trait for types that can be converted into an Error.
pub trait IntoError {
    /// Converts this type into an Error.
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        // One pointer wide
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("test error: {}", 42));
        assert_eq!(err.to_string(), "test error: 42");
    }

    #[test]
    fn error_chain_display() {
        let root = err!("root cause");
        let mid = err!("middle context");
        let top = err!("top context");

        let chained = root.context(mid).context(top);
        assert_eq!(
            chained.to_string(),
            "top context: middle context: root cause"
        );
        assert_eq!(chained.root().to_string(), "root cause");
    }

    #[test]
    fn anyhow_bridge() {
        let anyhow_err = anyhow::anyhow!("something failed");
        let our_err: Error = anyhow_err.into();
        assert_eq!(our_err.to_string(), "something failed");
    }

    #[test]
    fn type_conversion_error() {
        let value = crate::stmt::Value::from("abc");
        let err = Error::type_conversion(value, "I64");
        assert_eq!(err.to_string(), "cannot convert String to I64");
        assert!(err.is_type_conversion());
    }

    #[test]
    fn result_mapping_wraps_conversion() {
        let err = Error::type_conversion(crate::stmt::Value::from("abc"), "I64")
            .context(Error::result_mapping("AGE", 3));
        assert_eq!(
            err.to_string(),
            "could not map column `AGE` of row 3: cannot convert String to I64"
        );
        assert!(err.is_result_mapping());
        assert!(err.root().is_type_conversion());
    }

    #[test]
    fn invalid_schema_error() {
        let err = Error::invalid_schema("result map `blog` not found");
        assert_eq!(
            err.to_string(),
            "invalid schema: result map `blog` not found"
        );
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn invalid_record_count_error() {
        let err = Error::invalid_record_count("expected at most one row, found 2");
        assert_eq!(
            err.to_string(),
            "invalid record count: expected at most one row, found 2"
        );
        assert!(err.is_invalid_record_count());
    }

    #[test]
    fn lock_timeout_is_retryable() {
        let err = Error::lock_timeout("users", "17:42:user.find", 50);
        assert!(err.is_lock_timeout());
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "could not acquire lock for key `17:42:user.find` on cache `users` within 50ms"
        );
    }

    #[test]
    fn unknown_column_error() {
        let err = Error::unknown_column("user.find", "NICK", Some("nick"), None);
        assert!(err.is_unknown_column());
        assert_eq!(
            err.to_string(),
            "unknown column `NICK` in `user.find`: no settable property `nick`"
        );
    }
}
