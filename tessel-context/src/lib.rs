//! The context that owns array schema resources.
//!
//! A [`Context`] hands out [`RawArraySchema`] resources through a small raw API whose calls
//! report a [`Status`], persists schemas through a [`SchemaStore`], and takes every resource back
//! exactly once when it is dropped. [`ArraySchemaBuilder`] and [`ArraySchemaHandle`] are the safe
//! surface over that raw API.

pub use builder::*;
pub use context::*;
pub use handle::*;
pub use raw::*;
pub use status::*;
pub use store::*;

mod builder;
mod context;
mod handle;
mod raw;
mod status;
mod store;
