use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The return code of a raw schema-resource call.
///
/// A raw call never returns its error directly. It records the error on the [`Context`] and
/// returns a non-OK status, which must be routed through [`Context::handle_error`] before the
/// result of the call is trusted.
///
/// [`Context`]: crate::Context
/// [`Context::handle_error`]: crate::Context::handle_error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[must_use = "a raw call status must be passed to Context::handle_error"]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Err = -1,
    Oom = -2,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    pub fn code(&self) -> i32 {
        i32::from(*self)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Err => write!(f, "error"),
            Status::Oom => write!(f, "out of memory"),
        }
    }
}
