use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Whether every coordinate in the domain holds a cell, or only the written ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ArrayType {
    /// Every cell of the domain exists; coordinates are implicit.
    #[default]
    Dense = 0,
    /// Only explicitly written cells exist; coordinates are always required.
    Sparse = 1,
}

impl ArrayType {
    /// Returns `true` for [`ArrayType::Dense`].
    pub fn is_dense(&self) -> bool {
        matches!(self, ArrayType::Dense)
    }
}

impl Display for ArrayType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayType::Dense => write!(f, "dense"),
            ArrayType::Sparse => write!(f, "sparse"),
        }
    }
}

/// The order in which tiles, or cells within a tile, are laid out.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Layout {
    /// Last dimension varies fastest.
    #[default]
    RowMajor = 0,
    /// First dimension varies fastest.
    ColMajor = 1,
    /// The storage order of the array itself.
    GlobalOrder = 2,
    /// No particular order.
    Unordered = 3,
}

impl Layout {
    /// Whether the layout is valid as a tile or cell order of a schema.
    ///
    /// Global and unordered layouts only describe the order of cells handed to a query.
    pub fn is_schema_order(&self) -> bool {
        matches!(self, Layout::RowMajor | Layout::ColMajor)
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::RowMajor => write!(f, "row-major"),
            Layout::ColMajor => write!(f, "col-major"),
            Layout::GlobalOrder => write!(f, "global-order"),
            Layout::Unordered => write!(f, "unordered"),
        }
    }
}
