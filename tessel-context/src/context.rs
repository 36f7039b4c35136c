use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, RwLock};
use tessel_error::{TesselError, TesselResult, tessel_err};
use tessel_schema::Config;

use crate::{SchemaStore, Status, UriSchemaStore};

/// A callback invoked with every error surfaced by [`Context::handle_error`].
pub type ErrorHandler = Arc<dyn Fn(&TesselError) + Send + Sync>;

/// The owner of schema resources.
///
/// Every raw schema resource is acquired from a context and released back to that same context
/// exactly once, when the resource is dropped. A context is cheap to clone; clones share the
/// same configuration, store, error state and resource counters.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: Arc<Config>,
    store: Arc<dyn SchemaStore>,
    /// The error of the most recent failed raw call, per calling thread.
    last_errors: Mutex<HashMap<ThreadId, TesselError>>,
    error_handler: RwLock<Option<ErrorHandler>>,
    next_schema_id: AtomicU64,
    live_schemas: AtomicU64,
    released_schemas: AtomicU64,
}

impl Context {
    /// A context with the default [`Config`] that persists schemas by URI scheme.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_store(config, Arc::new(UriSchemaStore::default()))
    }

    /// A context persisting schemas through a custom [`SchemaStore`].
    pub fn with_store(config: Config, store: Arc<dyn SchemaStore>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                config: Arc::new(config),
                store,
                last_errors: Mutex::new(HashMap::new()),
                error_handler: RwLock::new(None),
                next_schema_id: AtomicU64::new(1),
                live_schemas: AtomicU64::new(0),
                released_schemas: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn store(&self) -> &dyn SchemaStore {
        self.inner.store.as_ref()
    }

    /// Install a callback that observes every error before it is returned to the caller.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&TesselError) + Send + Sync + 'static,
    {
        *self.inner.error_handler.write() = Some(Arc::new(handler));
    }

    /// Turn the status of a raw call into a result.
    ///
    /// A non-OK status surfaces the error the raw call recorded on this context from the calling
    /// thread. If nothing was recorded, the status itself becomes a [`TesselError::Native`].
    pub fn handle_error(&self, status: Status) -> TesselResult<()> {
        if status.is_ok() {
            return Ok(());
        }

        let err = self
            .inner
            .last_errors
            .lock()
            .remove(&thread::current().id())
            .unwrap_or_else(|| tessel_err!(Native: status.code(), "{status}"));
        log::debug!("raw call failed with status {status}: {}", err.message());

        let handler = self.inner.error_handler.read().clone();
        if let Some(handler) = handler {
            handler(&err);
        }
        Err(err)
    }

    /// Convert the outcome of a raw call into a [`Status`], recording any error.
    pub(crate) fn record(&self, result: TesselResult<()>) -> Status {
        match result {
            Ok(()) => Status::Ok,
            Err(err) => {
                self.inner
                    .last_errors
                    .lock()
                    .insert(thread::current().id(), err);
                Status::Err
            }
        }
    }

    /// Whether both values refer to the same context.
    pub fn same_context(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of schema resources acquired from this context and not yet released.
    pub fn live_schemas(&self) -> u64 {
        self.inner.live_schemas.load(Ordering::Acquire)
    }

    /// Number of schema resources released back to this context.
    pub fn schemas_released(&self) -> u64 {
        self.inner.released_schemas.load(Ordering::Acquire)
    }

    pub(crate) fn acquire_schema_id(&self) -> u64 {
        self.inner.live_schemas.fetch_add(1, Ordering::AcqRel);
        self.inner.next_schema_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn release_schema_id(&self, id: u64) {
        self.inner.live_schemas.fetch_sub(1, Ordering::AcqRel);
        self.inner.released_schemas.fetch_add(1, Ordering::AcqRel);
        log::trace!("released array schema resource {id}");
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.inner.config)
            .field("store", &self.inner.store)
            .field("live_schemas", &self.live_schemas())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::AtomicUsize;

    use tessel_error::tessel_err;

    use super::*;

    #[test]
    fn ok_status_passes() {
        let ctx = Context::new();
        assert!(ctx.handle_error(Status::Ok).is_ok());
    }

    #[test]
    fn recorded_error_is_surfaced_once() {
        let ctx = Context::new();
        let status = ctx.record(Err(tessel_err!(SchemaError: "duplicate dimension")));
        assert_eq!(status, Status::Err);

        let err = ctx.handle_error(status).unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));

        // Nothing recorded anymore, so the bare status is reported.
        let err = ctx.handle_error(Status::Oom).unwrap_err();
        assert!(matches!(err, TesselError::Native { code: -2, .. }));
    }

    #[test]
    fn error_handler_observes_errors() {
        let ctx = Context::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        ctx.set_error_handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let status = ctx.record(Err(tessel_err!("bad")));
        assert!(ctx.handle_error(status).is_err());
        assert!(ctx.handle_error(Status::Ok).is_ok());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_state() {
        let ctx = Context::new();
        let other = ctx.clone();
        assert!(ctx.same_context(&other));
        assert!(!ctx.same_context(&Context::new()));
    }

    #[test]
    fn errors_stay_with_the_calling_thread() {
        let ctx = Context::new();
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |kind: &'static str| {
            let ctx = ctx.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..2_000 {
                    let err = match kind {
                        "schema" => tessel_err!(SchemaError: "duplicate attribute"),
                        _ => tessel_err!(QueryError: "bad subarray"),
                    };
                    let status = ctx.record(Err(err));
                    let surfaced = ctx.handle_error(status).unwrap_err();
                    let matches_kind = match kind {
                        "schema" => matches!(surfaced, TesselError::SchemaError(..)),
                        _ => matches!(surfaced, TesselError::QueryError(..)),
                    };
                    assert!(matches_kind, "{kind} call surfaced {surfaced}");
                }
            })
        };

        let schema = spawn("schema");
        let query = spawn("query");
        schema.join().unwrap();
        query.join().unwrap();
        assert!(ctx.inner.last_errors.lock().is_empty());
    }
}
