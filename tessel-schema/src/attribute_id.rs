use std::fmt::{Display, Formatter};

use tessel_error::{TesselResult, tessel_bail};

/// The resolved identity of a requested attribute.
///
/// The coordinates pseudo-attribute is not part of a schema's attribute list. At the boundary
/// with the execution engine it is encoded as the raw id `attribute_count`, one past the last
/// real attribute; inside this crate it is always the [`AttributeId::Coordinates`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeId {
    /// Position of a real attribute within the schema.
    Attribute(usize),
    /// The implicit coordinates pseudo-attribute.
    Coordinates,
}

impl AttributeId {
    /// Encode as the positional integer the execution engine expects.
    pub fn to_raw(self, attribute_count: usize) -> usize {
        match self {
            AttributeId::Attribute(idx) => idx,
            AttributeId::Coordinates => attribute_count,
        }
    }

    /// Decode a raw positional id. Anything past `attribute_count` is rejected.
    pub fn from_raw(raw: usize, attribute_count: usize) -> TesselResult<Self> {
        if raw < attribute_count {
            Ok(AttributeId::Attribute(raw))
        } else if raw == attribute_count {
            Ok(AttributeId::Coordinates)
        } else {
            tessel_bail!(
                SchemaError: "attribute id {raw} out of range for {attribute_count} attributes"
            )
        }
    }

    pub fn is_coordinates(&self) -> bool {
        matches!(self, AttributeId::Coordinates)
    }
}

impl Display for AttributeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeId::Attribute(idx) => write!(f, "#{idx}"),
            AttributeId::Coordinates => write!(f, "coords"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_sentinel_is_attribute_count() {
        assert_eq!(AttributeId::Coordinates.to_raw(2), 2);
        assert_eq!(AttributeId::Attribute(1).to_raw(2), 1);
        assert_eq!(AttributeId::from_raw(2, 2).unwrap(), AttributeId::Coordinates);
        assert_eq!(AttributeId::from_raw(0, 2).unwrap(), AttributeId::Attribute(0));
        assert!(AttributeId::from_raw(3, 2).is_err());
    }
}
