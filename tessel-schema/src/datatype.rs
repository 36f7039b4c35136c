use std::fmt::{Debug, Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The physical type of a dimension coordinate or an attribute value.
///
/// The numeric codes are stable and shared with persisted schemas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Datatype {
    /// 32-bit signed integer
    Int32 = 0,
    /// 64-bit signed integer
    Int64 = 1,
    /// 32-bit IEEE-754 float
    Float32 = 2,
    /// 64-bit IEEE-754 float
    Float64 = 3,
    /// A single byte of character data
    Char = 4,
    /// 8-bit signed integer
    Int8 = 5,
    /// 8-bit unsigned integer
    UInt8 = 6,
    /// 16-bit signed integer
    Int16 = 7,
    /// 16-bit unsigned integer
    UInt16 = 8,
    /// 32-bit unsigned integer
    UInt32 = 9,
    /// 64-bit unsigned integer
    UInt64 = 10,
}

impl Datatype {
    /// The width in bytes of a single value of this type.
    pub const fn size(&self) -> usize {
        match self {
            Datatype::Int8 | Datatype::UInt8 | Datatype::Char => 1,
            Datatype::Int16 | Datatype::UInt16 => 2,
            Datatype::Int32 | Datatype::UInt32 | Datatype::Float32 => 4,
            Datatype::Int64 | Datatype::UInt64 | Datatype::Float64 => 8,
        }
    }

    /// Whether the type is an integer (signed or unsigned).
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Datatype::Int8
                | Datatype::Int16
                | Datatype::Int32
                | Datatype::Int64
                | Datatype::UInt8
                | Datatype::UInt16
                | Datatype::UInt32
                | Datatype::UInt64
        )
    }

    /// Whether the type is a floating point number.
    pub const fn is_float(&self) -> bool {
        matches!(self, Datatype::Float32 | Datatype::Float64)
    }

    /// Whether values of this type may be used as dimension coordinates.
    pub const fn is_coordinate(&self) -> bool {
        self.is_integer() || self.is_float()
    }
}

impl Display for Datatype {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Datatype::Int8 => write!(f, "i8"),
            Datatype::Int16 => write!(f, "i16"),
            Datatype::Int32 => write!(f, "i32"),
            Datatype::Int64 => write!(f, "i64"),
            Datatype::UInt8 => write!(f, "u8"),
            Datatype::UInt16 => write!(f, "u16"),
            Datatype::UInt32 => write!(f, "u32"),
            Datatype::UInt64 => write!(f, "u64"),
            Datatype::Float32 => write!(f, "f32"),
            Datatype::Float64 => write!(f, "f64"),
            Datatype::Char => write!(f, "char"),
        }
    }
}

/// A native Rust type usable as a dimension coordinate.
///
/// Coordinates are always stored little-endian, so the byte layout of a domain or a
/// sub-region is identical on every host.
pub trait CoordType:
    Copy + PartialOrd + Debug + Display + Send + Sync + Sized + 'static
{
    /// The [`Datatype`] this native type maps to.
    const DATATYPE: Datatype;

    /// Append the little-endian encoding of `self` to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode a value from exactly [`Datatype::size`] little-endian bytes.
    fn read_le(bytes: &[u8]) -> Option<Self>;

    /// Whether the value is strictly greater than zero.
    fn is_positive(self) -> bool;

    /// Whether a tile of `extent` fits inside the closed range `[low, high]`.
    fn extent_fits(low: Self, high: Self, extent: Self) -> bool;
}

macro_rules! int_coord_type {
    ($T:ty, $dt:ident) => {
        impl CoordType for $T {
            const DATATYPE: Datatype = Datatype::$dt;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                <[u8; size_of::<$T>()]>::try_from(bytes)
                    .ok()
                    .map(<$T>::from_le_bytes)
            }

            fn is_positive(self) -> bool {
                self > 0
            }

            fn extent_fits(low: Self, high: Self, extent: Self) -> bool {
                i128::from(high) - i128::from(low) + 1 >= i128::from(extent)
            }
        }
    };
}

macro_rules! float_coord_type {
    ($T:ty, $dt:ident) => {
        impl CoordType for $T {
            const DATATYPE: Datatype = Datatype::$dt;

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                <[u8; size_of::<$T>()]>::try_from(bytes)
                    .ok()
                    .map(<$T>::from_le_bytes)
            }

            fn is_positive(self) -> bool {
                self > 0.0
            }

            fn extent_fits(low: Self, high: Self, extent: Self) -> bool {
                high - low >= extent
            }
        }
    };
}

int_coord_type!(i8, Int8);
int_coord_type!(i16, Int16);
int_coord_type!(i32, Int32);
int_coord_type!(i64, Int64);
int_coord_type!(u8, UInt8);
int_coord_type!(u16, UInt16);
int_coord_type!(u32, UInt32);
int_coord_type!(u64, UInt64);
float_coord_type!(f32, Float32);
float_coord_type!(f64, Float64);

/// Macro to match over each coordinate [`Datatype`], binding the corresponding native type.
///
/// [`Datatype::Char`] binds `u8`; callers that must reject character coordinates check
/// [`Datatype::is_coordinate`] first.
#[macro_export]
macro_rules! match_each_coord_type {
    ($self:expr, | $enc:ident | $body:block) => {{
        use $crate::Datatype;
        match $self {
            Datatype::Int8 => {
                type $enc = i8;
                $body
            }
            Datatype::Int16 => {
                type $enc = i16;
                $body
            }
            Datatype::Int32 => {
                type $enc = i32;
                $body
            }
            Datatype::Int64 => {
                type $enc = i64;
                $body
            }
            Datatype::UInt8 | Datatype::Char => {
                type $enc = u8;
                $body
            }
            Datatype::UInt16 => {
                type $enc = u16;
                $body
            }
            Datatype::UInt32 => {
                type $enc = u32;
                $body
            }
            Datatype::UInt64 => {
                type $enc = u64;
                $body
            }
            Datatype::Float32 => {
                type $enc = f32;
                $body
            }
            Datatype::Float64 => {
                type $enc = f64;
                $body
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Datatype::Int8, 1)]
    #[case(Datatype::Char, 1)]
    #[case(Datatype::UInt16, 2)]
    #[case(Datatype::Float32, 4)]
    #[case(Datatype::Int64, 8)]
    fn sizes(#[case] datatype: Datatype, #[case] size: usize) {
        assert_eq!(datatype.size(), size);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(u8::from(Datatype::Int32), 0);
        assert_eq!(u8::from(Datatype::UInt64), 10);
        assert_eq!(Datatype::try_from(3u8).unwrap(), Datatype::Float64);
        assert!(Datatype::try_from(11u8).is_err());
    }

    #[test]
    fn char_is_not_a_coordinate() {
        assert!(!Datatype::Char.is_coordinate());
        assert!(Datatype::Float64.is_coordinate());
    }

    #[test]
    fn little_endian_encoding() {
        let mut out = Vec::new();
        258u16.write_le(&mut out);
        assert_eq!(out, vec![2, 1]);
        assert_eq!(u16::read_le(&out), Some(258));
        assert_eq!(u16::read_le(&out[..1]), None);
    }

    #[test]
    fn extents() {
        assert!(i32::extent_fits(1, 4, 4));
        assert!(!i32::extent_fits(1, 4, 5));
        assert!(u64::extent_fits(0, u64::MAX, u64::MAX));
        assert!(f64::extent_fits(0.0, 1.0, 0.5));
        assert!(!f64::extent_fits(0.0, 1.0, 1.5));
    }

    #[test]
    fn match_each_binds_native_type() {
        let size = match_each_coord_type!(Datatype::Int16, |T| { size_of::<T>() });
        assert_eq!(size, 2);
    }
}
