#![deny(missing_docs)]

//! Error handling for tabula.
//!
//! Every failure raised by the adapter layer is local, synchronous and fail-fast. The
//! [`TabulaError`] variants name the kind of violation so callers can match on it, and each
//! variant captures a backtrace at the point the error was constructed.

// Aliased so `thiserror` does not treat these fields as backtrace sources, which would emit a
// nightly-only `Error::provide` impl; the field type is still `std::backtrace::Backtrace`.
use std::backtrace::Backtrace as CapturedBacktrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

/// A string that can be used as an error message.
#[derive(Debug)]
pub struct ErrString(Cow<'static, str>);

impl<T> From<T> for ErrString
where
    T: Into<Cow<'static, str>>,
{
    fn from(msg: T) -> Self {
        Self(msg.into())
    }
}

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for tabula.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum TabulaError {
    /// A field name is not part of the format being queried or modified.
    #[error("field {0} not found\nBacktrace:\n{1}")]
    FieldNotFound(ErrString, CapturedBacktrace),
    /// A field with the same name already exists.
    #[error("field {0} already exists\nBacktrace:\n{1}")]
    DuplicateField(ErrString, CapturedBacktrace),
    /// A row or field position lies outside of the valid range `[start, stop)`.
    #[error("index {0} out of range from {1} to {2}\nBacktrace:\n{3}")]
    IndexOutOfRange(usize, usize, usize, CapturedBacktrace),
    /// The raw data is not the structural shape the adapter expects.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidPayloadShape(ErrString, CapturedBacktrace),
    /// The operation has no meaning for the adapter it was called on.
    #[error("{0}\nBacktrace:\n{1}")]
    UnsupportedOperation(ErrString, CapturedBacktrace),
    /// A columnar node references a format id which is not defined anywhere in the payload.
    #[error("format {0} is not defined anywhere in the payload\nBacktrace:\n{1}")]
    UnresolvedFormatReference(u64, CapturedBacktrace),
    /// An argument is invalid for reasons not covered by the other variants.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// An error with additional context.
    #[error("{0}: {1}")]
    Context(ErrString, Box<TabulaError>),
    /// A wrapper for errors from the JSON library.
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl TabulaError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        TabulaError::Context(msg.into(), Box::new(self))
    }

    /// Returns the innermost error, skipping over any context layers.
    pub fn root(&self) -> &TabulaError {
        match self {
            TabulaError::Context(_, inner) => inner.root(),
            other => other,
        }
    }
}

impl Debug for TabulaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return TabulaErrors as their error type.
pub type TabulaResult<T> = Result<T, TabulaError>;

/// A convenient macro for creating a [`TabulaError`].
///
/// The first token selects the variant, e.g. `tabula_err!(FieldNotFound: "{}", name)`. A bare
/// format string produces [`TabulaError::InvalidArgument`].
#[macro_export]
macro_rules! tabula_err {
    (FieldNotFound: $($tt:tt)+) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::FieldNotFound(format!($($tt)+).into(), Backtrace::capture())
    }};
    (DuplicateField: $($tt:tt)+) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::DuplicateField(format!($($tt)+).into(), Backtrace::capture())
    }};
    (IndexOutOfRange: $idx:expr, $start:expr, $stop:expr) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::IndexOutOfRange($idx, $start, $stop, Backtrace::capture())
    }};
    (InvalidPayloadShape: $($tt:tt)+) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::InvalidPayloadShape(format!($($tt)+).into(), Backtrace::capture())
    }};
    (UnsupportedOperation: $($tt:tt)+) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::UnsupportedOperation(format!($($tt)+).into(), Backtrace::capture())
    }};
    (UnresolvedFormatReference: $id:expr) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::UnresolvedFormatReference($id, Backtrace::capture())
    }};
    (Context: $msg:literal, $err:expr) => {{
        $crate::TabulaError::Context($msg.into(), Box::new($err))
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::TabulaError::InvalidArgument(format!($fmt $(, $arg)*).into(), Backtrace::capture())
    }};
}

/// A convenient macro for returning a [`TabulaError`] from the enclosing function.
#[macro_export]
macro_rules! tabula_bail {
    ($($tt:tt)+) => {
        return Err($crate::tabula_err!($($tt)+))
    };
}
