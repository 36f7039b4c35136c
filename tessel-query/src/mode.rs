use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// What a query does with the cells it covers. Fixed when the query is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum QueryMode {
    Read = 0,
    /// Write cells in the global cell order of the array.
    Write = 1,
    /// Write cells sorted in the layout of the sub-region.
    WriteSorted = 2,
    /// Write cells in arbitrary order, each accompanied by its coordinates.
    WriteUnsorted = 3,
}

impl QueryMode {
    pub fn is_read(&self) -> bool {
        matches!(self, QueryMode::Read)
    }

    pub fn is_write(&self) -> bool {
        !self.is_read()
    }
}

impl Display for QueryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::Read => write!(f, "read"),
            QueryMode::Write => write!(f, "write"),
            QueryMode::WriteSorted => write!(f, "write-sorted"),
            QueryMode::WriteUnsorted => write!(f, "write-unsorted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(u8::from(QueryMode::WriteUnsorted), 3);
        assert_eq!(QueryMode::try_from(2u8).unwrap(), QueryMode::WriteSorted);
        assert!(QueryMode::try_from(4u8).is_err());
    }
}
