use super::Error;

/// Error when automatic mapping finds a column it cannot place on the target,
/// raised under the failing unknown-column policy.
#[derive(Debug)]
pub(super) struct UnknownColumn {
    statement: Box<str>,
    column: Box<str>,
    property: Option<Box<str>>,
    property_type: Option<Box<str>>,
}

impl std::error::Error for UnknownColumn {}

impl core::fmt::Display for UnknownColumn {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown column `{}` in `{}`", self.column, self.statement)?;
        match (&self.property, &self.property_type) {
            (Some(property), Some(ty)) => write!(
                f,
                ": no type handler for property `{}` of type {}",
                property, ty
            ),
            (Some(property), None) => write!(f, ": no settable property `{}`", property),
            _ => Ok(()),
        }
    }
}

impl Error {
    /// Creates an unknown column error.
    pub fn unknown_column(
        statement: impl Into<String>,
        column: impl Into<String>,
        property: Option<&str>,
        property_type: Option<&str>,
    ) -> Error {
        Error::from(super::ErrorKind::UnknownColumn(UnknownColumn {
            statement: statement.into().into(),
            column: column.into().into(),
            property: property.map(Into::into),
            property_type: property_type.map(Into::into),
        }))
    }

    /// Returns `true` if this error is an unknown column error.
    pub fn is_unknown_column(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::UnknownColumn(_))
    }
}
