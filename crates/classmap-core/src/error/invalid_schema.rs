use super::Error;

/// Error when the class graph cannot be mapped.
///
/// This occurs when:
/// - A base class map is missing or the inheritance graph has a cycle
/// - A navigation property references an unknown or unmapped relationship
/// - A class changes its map strategy after it was persisted
/// - Persisted mapping metadata does not match the class graph
///
/// Schema errors abort the whole mapping operation.
#[derive(Debug)]
pub(super) struct InvalidSchema {
    message: Box<str>,
}

impl std::error::Error for InvalidSchema {}

impl core::fmt::Display for InvalidSchema {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchema {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }
}
