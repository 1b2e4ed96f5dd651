use super::Error;

/// Error raised while mapping one column of one row. The conversion failure
/// that caused it is attached as the cause.
#[derive(Debug)]
pub(super) struct ResultMappingError {
    column: Box<str>,
    row: usize,
}

impl std::error::Error for ResultMappingError {}

impl core::fmt::Display for ResultMappingError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "could not map column `{}` of row {}", self.column, self.row)
    }
}

impl Error {
    /// Creates a result mapping error for `column` of the given 1-based row.
    ///
    /// Typically used as context: `err.context(Error::result_mapping(..))`.
    pub fn result_mapping(column: impl Into<String>, row: usize) -> Error {
        Error::from(super::ErrorKind::ResultMapping(ResultMappingError {
            column: column.into().into(),
            row,
        }))
    }

    /// Returns `true` if this error is a result mapping error.
    pub fn is_result_mapping(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ResultMapping(_))
    }
}
