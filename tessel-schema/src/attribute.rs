use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

use tessel_error::{TesselResult, tessel_bail};

use crate::{Compression, Config, Datatype};

/// How many values of the attribute's datatype make up one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellValNum {
    /// Every cell holds exactly this many values.
    Fixed(NonZeroU32),
    /// Cells hold a varying number of values, stored as an offsets buffer plus a data buffer.
    Var,
}

impl CellValNum {
    pub const SINGLE: Self = CellValNum::Fixed(NonZeroU32::MIN);
}

impl Default for CellValNum {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl Display for CellValNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValNum::Fixed(n) => write!(f, "{n}"),
            CellValNum::Var => write!(f, "var"),
        }
    }
}

/// A named value stored in every cell of an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    name: String,
    datatype: Datatype,
    #[cfg_attr(feature = "serde", serde(default))]
    cell_val_num: CellValNum,
    #[cfg_attr(feature = "serde", serde(default))]
    compression: Compression,
}

impl Attribute {
    /// A fixed-size, single-valued, uncompressed attribute.
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            cell_val_num: CellValNum::SINGLE,
            compression: Compression::NONE,
        }
    }

    pub fn with_cell_val_num(mut self, cell_val_num: CellValNum) -> Self {
        self.cell_val_num = cell_val_num;
        self
    }

    /// Shorthand for `with_cell_val_num(CellValNum::Var)`.
    pub fn with_var_size(self) -> Self {
        self.with_cell_val_num(CellValNum::Var)
    }

    pub fn with_compression<C: Into<Compression>>(mut self, compression: C) -> Self {
        self.compression = compression.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn cell_val_num(&self) -> CellValNum {
        self.cell_val_num
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Whether cells of this attribute vary in size.
    pub fn is_var(&self) -> bool {
        matches!(self.cell_val_num, CellValNum::Var)
    }

    /// Bytes per cell, or `None` for variable-sized attributes.
    pub fn cell_size(&self) -> Option<u64> {
        match self.cell_val_num {
            CellValNum::Fixed(n) => Some(u64::from(n.get()) * self.datatype.size() as u64),
            CellValNum::Var => None,
        }
    }

    pub fn check(&self, config: &Config) -> TesselResult<()> {
        if !config.is_valid_name(&self.name) {
            tessel_bail!(SchemaError: "invalid attribute name length: '{}'", self.name);
        }
        if self.name == config.coords_name() {
            tessel_bail!(
                SchemaError: "attribute name '{}' is reserved for coordinates",
                self.name
            );
        }
        Ok(())
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} x {} ({})",
            self.name, self.datatype, self.cell_val_num, self.compression
        )
    }
}
