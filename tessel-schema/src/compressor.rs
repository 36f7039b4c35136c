use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// A compression scheme applied to the tiles of an attribute or of the coordinates.
///
/// Only the choice is recorded here; the codecs themselves live in the storage layer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Compressor {
    #[default]
    NoCompression = 0,
    Gzip = 1,
    Zstd = 2,
    Lz4 = 3,
    BloscLz = 4,
    BloscLz4 = 5,
    BloscLz4hc = 6,
    BloscSnappy = 7,
    BloscZlib = 8,
    BloscZstd = 9,
    Rle = 10,
    Bzip2 = 11,
    DoubleDelta = 12,
}

impl Display for Compressor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compressor::NoCompression => "none",
            Compressor::Gzip => "gzip",
            Compressor::Zstd => "zstd",
            Compressor::Lz4 => "lz4",
            Compressor::BloscLz => "blosc-lz",
            Compressor::BloscLz4 => "blosc-lz4",
            Compressor::BloscLz4hc => "blosc-lz4hc",
            Compressor::BloscSnappy => "blosc-snappy",
            Compressor::BloscZlib => "blosc-zlib",
            Compressor::BloscZstd => "blosc-zstd",
            Compressor::Rle => "rle",
            Compressor::Bzip2 => "bzip2",
            Compressor::DoubleDelta => "double-delta",
        };
        write!(f, "{name}")
    }
}

/// A [`Compressor`] together with its level. `-1` selects the codec default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Compression {
    pub compressor: Compressor,
    pub level: i32,
}

impl Compression {
    pub const NONE: Self = Self::new(Compressor::NoCompression, -1);

    pub const fn new(compressor: Compressor, level: i32) -> Self {
        Self { compressor, level }
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<Compressor> for Compression {
    fn from(compressor: Compressor) -> Self {
        Self::new(compressor, -1)
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.level < 0 {
            write!(f, "{}", self.compressor)
        } else {
            write!(f, "{}({})", self.compressor, self.level)
        }
    }
}
