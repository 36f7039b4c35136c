//! Query resolution for Tessel arrays.
//!
//! A client declares a query as a schema, a [`QueryMode`], an optional list of attribute names and
//! an optional sub-region. This crate turns that declaration into a [`Query`]: the attribute ids
//! in the order the execution engine sees them, a byte-exact [`Subarray`], and the buffer slot
//! layout the engine fills or consumes.

pub use mode::*;
pub use query::*;
pub use resolve::*;
pub use subarray::*;

mod mode;
mod query;
mod resolve;
mod subarray;

/// Two `i64` dimensions `rows`/`cols` over `[1, 4]`, a fixed `Int32` attribute `a` and a
/// variable-size `Char` attribute `b`.
#[cfg(test)]
pub(crate) fn test_schema(array_type: tessel_schema::ArrayType) -> tessel_schema::ArraySchema {
    use tessel_schema::{ArraySchema, Attribute, Config, Datatype, Dimension};

    let config = Config::default();
    let mut schema = ArraySchema::new(array_type);
    schema
        .add_dimension(Dimension::new("rows", [1i64, 4], Some(2)).unwrap())
        .unwrap();
    schema
        .add_dimension(Dimension::new("cols", [1i64, 4], Some(2)).unwrap())
        .unwrap();
    schema
        .add_attribute(Attribute::new("a", Datatype::Int32), &config)
        .unwrap();
    schema
        .add_attribute(Attribute::new("b", Datatype::Char).with_var_size(), &config)
        .unwrap();
    schema
}
