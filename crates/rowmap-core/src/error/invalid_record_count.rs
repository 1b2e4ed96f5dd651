use super::Error;

/// Error when a relation receives more rows than it has targets for.
///
/// This occurs when:
/// - A nested query mapped to a single-valued property returns several rows
/// - A later resultset supplies a second row for a single-valued relation
/// - Two different properties claim the same named resultset
#[derive(Debug)]
pub(super) struct InvalidRecordCount {
    context: Option<Box<str>>,
}

impl std::error::Error for InvalidRecordCount {}

impl core::fmt::Display for InvalidRecordCount {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("invalid record count")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates an invalid record count error.
    pub fn invalid_record_count(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidRecordCount(InvalidRecordCount {
            context: Some(context.into().into()),
        }))
    }

    /// Returns `true` if this error is an invalid record count error.
    pub fn is_invalid_record_count(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidRecordCount(_))
    }
}
