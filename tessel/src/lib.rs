//! Tessel: the query-binding and schema-handle layer of a multidimensional array engine.
//!
//! Schemas are assembled with an [`ArraySchemaBuilder`], persisted and loaded through a
//! [`Context`], and shared through [`ArraySchemaHandle`]s. Queries are resolved against a loaded
//! handle with [`open_query`].
//!
//! ```
//! use tessel::schema::{ArrayType, Attribute, Datatype, Dimension};
//! use tessel::query::QueryMode;
//! use tessel::{ArraySchemaBuilder, Context, open_query};
//!
//! let ctx = Context::new();
//! let mut builder = ArraySchemaBuilder::new(&ctx, ArrayType::Sparse)?;
//! builder
//!     .add_dimension(Dimension::new("x", [0u64, 99], Some(10))?)?
//!     .add_attribute(Attribute::new("v", Datatype::Float64))?;
//! let handle = builder.create("mem://doc/points")?;
//!
//! let query = open_query(&handle, QueryMode::Read, Some(&["v"]), None)?;
//! assert_eq!(query.raw_attribute_ids(), vec![0, 1]);
//! assert_eq!(query.coords_buffer_index()?, 1);
//! # Ok::<(), tessel::error::TesselError>(())
//! ```

pub use logging::*;
pub use tessel_context::{ArraySchemaBuilder, ArraySchemaHandle, Context, Status};
pub use {
    tessel_context as context, tessel_error as error, tessel_query as query,
    tessel_schema as schema,
};

use tessel_error::TesselResult;
use tessel_query::{Query, QueryMode};

mod logging;

/// Resolve a query against the schema held by `handle`, using its context's configuration.
///
/// Fails with a schema error if the handle is empty.
pub fn open_query(
    handle: &ArraySchemaHandle,
    mode: QueryMode,
    attributes: Option<&[&str]>,
    subarray: Option<&[u8]>,
) -> TesselResult<Query> {
    Query::try_new(
        handle.schema()?,
        mode,
        attributes,
        subarray,
        handle.context().config(),
    )
}
