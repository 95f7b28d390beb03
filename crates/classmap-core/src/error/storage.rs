use super::Error;

/// Error when a storage engine operation fails.
///
/// This wraps errors from the underlying engine library:
/// - Opening the database
/// - DDL execution (CREATE TABLE, ALTER TABLE, CREATE TRIGGER)
/// - Statement execution and row reads
/// - Transaction control (BEGIN, COMMIT, ROLLBACK)
///
/// Engine failures are never retried by the mapping layer. The enclosing
/// transaction is responsible for atomicity.
#[derive(Debug)]
pub(super) struct Storage {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for Storage {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for Storage {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.inner, f)?;
        let mut source = self.inner.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

impl Error {
    /// Creates a storage error from an engine failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::Storage(Storage {
            inner: Box::new(err),
        }))
    }

    /// Returns `true` if this error is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Storage(_))
    }
}
