//! Schema descriptors for Tessel arrays.
//!
//! This crate contains the value objects a query is resolved against: dimensions and the domain
//! they span, attributes, and the [`ArraySchema`] that aggregates them together with its
//! dense/sparse flag and cell layout. Coordinates are encoded little-endian throughout, so the
//! byte form of a domain is also the byte form of a sub-region over it.

pub use attribute::*;
pub use attribute_id::*;
pub use compressor::*;
pub use config::*;
pub use datatype::*;
pub use dimension::*;
pub use domain::*;
pub use layout::*;
pub use schema::*;

mod attribute;
mod attribute_id;
mod compressor;
mod config;
mod datatype;
mod dimension;
mod domain;
mod layout;
mod schema;
