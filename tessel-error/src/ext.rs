use crate::{ErrString, TesselResult};

/// Extension trait for TesselResult
pub trait ResultExt<T>: private::Sealed {
    /// Wrap the error, if any, with a context message.
    fn context<M: Into<ErrString>>(self, msg: M) -> TesselResult<T>;

    /// Wrap the error, if any, with a lazily built context message.
    fn with_context<M: Into<ErrString>, F: FnOnce() -> M>(self, f: F) -> TesselResult<T>;
}

mod private {
    use crate::TesselResult;

    pub trait Sealed {}

    impl<T> Sealed for TesselResult<T> {}
}

impl<T> ResultExt<T> for TesselResult<T> {
    fn context<M: Into<ErrString>>(self, msg: M) -> TesselResult<T> {
        self.map_err(|e| e.with_context(msg))
    }

    fn with_context<M: Into<ErrString>, F: FnOnce() -> M>(self, f: F) -> TesselResult<T> {
        self.map_err(|e| e.with_context(f()))
    }
}
