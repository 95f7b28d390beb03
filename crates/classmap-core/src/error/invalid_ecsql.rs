use super::Error;

/// Error when an ECSQL statement is malformed.
///
/// This occurs when:
/// - A property name does not resolve to a property map or a column alias
/// - The statement targets a class it cannot modify (end-table relationships
///   on INSERT, readonly properties on UPDATE)
/// - The number of values does not match the number of properties
///
/// This is the "your query is malformed" status, distinct from internal
/// preparer failures.
#[derive(Debug)]
pub(super) struct InvalidEcsql {
    message: Box<str>,
}

impl std::error::Error for InvalidEcsql {}

impl core::fmt::Display for InvalidEcsql {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid ECSQL: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid ECSQL error.
    pub fn invalid_ecsql(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidEcsql(InvalidEcsql {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid ECSQL error.
    pub fn is_invalid_ecsql(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidEcsql(_))
    }
}
