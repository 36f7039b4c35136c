#![deny(missing_docs)]

//! Error handling for Tessel.
//!
//! Every fallible operation in the workspace returns a [`TesselResult`]. The error kinds mirror
//! the layer a failure originates from: schema state, query resolution, or downstream
//! consistency of a resolved plan.

mod ext;

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;
use std::{fmt, io};

pub use ext::*;

// `thiserror` special-cases fields whose type is literally named `Backtrace` and emits
// nightly-only `provide` code for them; the alias keeps the type identical on stable.
type CapturedBacktrace = Backtrace;

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
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// The top-level error type for Tessel.
#[derive(thiserror::Error)]
#[non_exhaustive]
pub enum TesselError {
    /// Invalid or absent schema state: an unknown attribute, an empty handle or a rejected
    /// build step.
    #[error("{0}\nBacktrace:\n{1}")]
    SchemaError(ErrString, CapturedBacktrace),
    /// A query declaration that cannot be resolved into an execution plan.
    #[error("{0}\nBacktrace:\n{1}")]
    QueryError(ErrString, CapturedBacktrace),
    /// A resolved plan that is inconsistent with what the execution engine requires.
    #[error("{0}\nBacktrace:\n{1}")]
    ArrayError(ErrString, CapturedBacktrace),
    /// An invalid argument was provided.
    #[error("{0}\nBacktrace:\n{1}")]
    InvalidArgument(ErrString, CapturedBacktrace),
    /// A raw resource call reported a non-OK status without recording a richer error.
    #[error("native call failed with status {code}: {message}")]
    Native {
        /// The numeric status code returned by the raw call.
        code: i32,
        /// The message recorded alongside the status.
        message: ErrString,
    },
    /// Wraps an error with additional context.
    #[error("{0}: {1}")]
    Context(ErrString, #[source] Box<TesselError>),
    /// A wrapper for IO errors.
    #[error(transparent)]
    IOError(#[from] io::Error),
    /// A wrapper for serde_json errors.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl TesselError {
    /// Adds additional context to an error.
    pub fn with_context<T: Into<ErrString>>(self, msg: T) -> Self {
        TesselError::Context(msg.into(), Box::new(self))
    }

    /// The innermost error, skipping over any [`TesselError::Context`] wrappers.
    pub fn root(&self) -> &TesselError {
        match self {
            TesselError::Context(_, inner) => inner.root(),
            other => other,
        }
    }

    /// The message of this error without the captured backtrace.
    pub fn message(&self) -> String {
        match self {
            TesselError::SchemaError(msg, _)
            | TesselError::QueryError(msg, _)
            | TesselError::ArrayError(msg, _)
            | TesselError::InvalidArgument(msg, _) => msg.to_string(),
            TesselError::Native { message, .. } => message.to_string(),
            TesselError::Context(msg, inner) => format!("{msg}: {}", inner.message()),
            other => other.to_string(),
        }
    }
}

impl Debug for TesselError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

/// A type alias for Results that return [`TesselError`]s as their error type.
pub type TesselResult<T> = Result<T, TesselError>;

/// A trait for expect-ing a [`TesselResult`] or an [`Option`].
pub trait TesselExpect {
    /// The type of the value being expected.
    type Output;

    /// Returns the value of the result if it is Ok, otherwise panics with the error.
    /// Should be called only where the error condition represents a bug.
    fn tessel_expect(self, msg: &str) -> Self::Output;
}

impl<T, E> TesselExpect for Result<T, E>
where
    E: Into<TesselError>,
{
    type Output = T;

    #[inline(always)]
    #[allow(clippy::panic)]
    fn tessel_expect(self, msg: &str) -> Self::Output {
        self.map_err(Into::<TesselError>::into)
            .unwrap_or_else(|e| panic!("{}", e.with_context(msg.to_string())))
    }
}

impl<T> TesselExpect for Option<T> {
    type Output = T;

    #[inline(always)]
    #[allow(clippy::panic)]
    fn tessel_expect(self, msg: &str) -> Self::Output {
        self.unwrap_or_else(|| panic!("{msg}"))
    }
}

/// A convenient macro for creating a [`TesselError`].
///
/// The variant is named with a `Variant:` prefix; without one the error is an
/// [`TesselError::InvalidArgument`].
#[macro_export]
macro_rules! tessel_err {
    (Context: $msg:literal, $err:expr) => {{
        $crate::__private::must_use(
            $crate::TesselError::Context($msg.into(), Box::new($err))
        )
    }};
    (Native: $code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
        $crate::__private::must_use(
            $crate::TesselError::Native { code: $code, message: format!($fmt, $($arg),*).into() }
        )
    }};
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {{
        use std::backtrace::Backtrace;
        $crate::__private::must_use(
            $crate::TesselError::$variant(format!($fmt, $($arg),*).into(), Backtrace::capture())
        )
    }};
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::tessel_err!(InvalidArgument: $fmt, $($arg),*)
    };
}

/// A convenience macro for returning a [`TesselError`] from a function.
#[macro_export]
macro_rules! tessel_bail {
    ($($tt:tt)+) => {
        return Err($crate::tessel_err!($($tt)+))
    };
}

#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub const fn must_use(error: crate::TesselError) -> crate::TesselError {
        error
    }
}
