use super::Error;

/// Error when a value cannot be bound to a statement parameter.
#[derive(Debug)]
pub(super) struct InvalidBinding {
    message: Box<str>,
}

impl std::error::Error for InvalidBinding {}

impl core::fmt::Display for InvalidBinding {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid binding: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid binding error.
    pub fn invalid_binding(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidBinding(InvalidBinding {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid binding error.
    pub fn is_invalid_binding(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidBinding(_))
    }
}
