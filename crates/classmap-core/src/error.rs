mod adhoc;
mod internal;
mod invalid_binding;
mod invalid_connection_url;
mod invalid_ecsql;
mod invalid_schema;
mod storage;

use adhoc::AdhocError;
use internal::Internal;
use invalid_binding::InvalidBinding;
use invalid_connection_url::InvalidConnectionUrl;
use invalid_ecsql::InvalidEcsql;
use invalid_schema::InvalidSchema;
use std::sync::Arc;
use storage::Storage;

/// Returns early with an ad hoc error built from format arguments.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Creates an ad hoc error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error raised while mapping classes, persisting mapping metadata,
/// preparing statements or talking to the storage engine.
///
/// The error is a single pointer wide. Context can be layered on top with
/// [`Error::context`]; `Display` prints the whole chain, most recent context
/// first.
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
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let mut err = consequent;
        if err.inner.is_none() {
            err = Error::from(ErrorKind::Unknown);
        }
        let inner = err.inner.as_mut().unwrap();
        assert!(
            inner.cause.is_none(),
            "consequent error must not already have a cause"
        );
        Arc::get_mut(inner).unwrap().cause = Some(self);
        err
    }

    /// Returns `true` if this error, or any error in its context chain,
    /// satisfies `f`.
    pub fn any(&self, f: impl Fn(&Error) -> bool) -> bool {
        self.chain().any(f)
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
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Storage(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
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
    Storage(Storage),
    InvalidSchema(InvalidSchema),
    InvalidEcsql(InvalidEcsql),
    InvalidBinding(InvalidBinding),
    InvalidConnectionUrl(InvalidConnectionUrl),
    Internal(Internal),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use self::ErrorKind::*;

        match self {
            Anyhow(err) => core::fmt::Display::fmt(err, f),
            Adhoc(err) => core::fmt::Display::fmt(err, f),
            Storage(err) => core::fmt::Display::fmt(err, f),
            InvalidSchema(err) => core::fmt::Display::fmt(err, f),
            InvalidEcsql(err) => core::fmt::Display::fmt(err, f),
            InvalidBinding(err) => core::fmt::Display::fmt(err, f),
            InvalidConnectionUrl(err) => core::fmt::Display::fmt(err, f),
            Internal(err) => core::fmt::Display::fmt(err, f),
            Unknown => f.write_str("unknown classmap error"),
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

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
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
        let expected_size = core::mem::size_of::<usize>();
        assert_eq!(expected_size, core::mem::size_of::<Error>());
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("class {} has no base map", 42));
        assert_eq!(err.to_string(), "class 42 has no base map");
    }

    #[test]
    fn error_chain_display() {
        let root = Error::invalid_schema("class `Foo` inherits from itself");
        let err = root.context(err!("failed to map schema `Test`"));
        assert_eq!(
            err.to_string(),
            "failed to map schema `Test`: invalid schema: class `Foo` inherits from itself"
        );
    }

    #[test]
    fn predicates_look_at_the_head_only() {
        let err = Error::invalid_ecsql("unknown property `Bar`").context(err!("prepare"));
        assert!(!err.is_invalid_ecsql());
        assert!(err.any(Error::is_invalid_ecsql));
    }

    #[test]
    fn storage_error_display_walks_sources() {
        #[derive(Debug)]
        struct Inner;
        impl core::fmt::Display for Inner {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("disk I/O error")
            }
        }
        impl std::error::Error for Inner {}

        let err = Error::storage(Inner);
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "disk I/O error");
    }

    #[test]
    fn invalid_binding_display() {
        let err = Error::invalid_binding("parameter index 3 out of range");
        assert!(err.is_invalid_binding());
        assert_eq!(
            err.to_string(),
            "invalid binding: parameter index 3 out of range"
        );
    }
}
