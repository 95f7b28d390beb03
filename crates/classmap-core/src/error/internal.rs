use super::Error;

/// An internal consistency check failed in the mapper or the preparer.
///
/// These indicate a bug in the mapper or preparer rather than bad input.
#[derive(Debug)]
pub(super) struct Internal {
    message: Box<str>,
}

impl std::error::Error for Internal {}

impl core::fmt::Display for Internal {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "internal error: {}", self.message)
    }
}

impl Error {
    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Internal(Internal {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an internal error.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Internal(_))
    }
}
