use tessel_error::{TesselResult, tessel_bail, tessel_err};
use tessel_schema::CoordType;

/// The sub-region of a query: one `(low, high)` pair per dimension, little-endian.
///
/// The buffer is allocated once at its final size and is never resized afterwards; re-binding a
/// query overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subarray(Box<[u8]>);

impl Subarray {
    /// Allocate a zeroed buffer of `len` bytes. Allocation failure is reported, never aborts.
    pub fn allocate(len: usize) -> TesselResult<Self> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|e| tessel_err!(QueryError: "memory allocation for subarray failed: {e}"))?;
        buffer.resize(len, 0);
        Ok(Self(buffer.into_boxed_slice()))
    }

    /// Overwrite the buffer with `bytes`, which must have exactly the buffer's length.
    pub fn fill_from(&mut self, bytes: &[u8]) -> TesselResult<()> {
        if bytes.len() != self.0.len() {
            tessel_bail!(
                QueryError: "subarray must be {} bytes, got {}",
                self.0.len(),
                bytes.len()
            );
        }
        self.0.copy_from_slice(bytes);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.0
    }

    /// Decode the per-dimension ranges, assuming coordinates of type `T`.
    pub fn ranges<T: CoordType>(&self) -> TesselResult<Vec<[T; 2]>> {
        let width = T::DATATYPE.size();
        let chunks = self.0.chunks_exact(2 * width);
        if !chunks.remainder().is_empty() {
            tessel_bail!(
                "subarray of {} bytes is not a whole number of {} ranges",
                self.0.len(),
                T::DATATYPE
            );
        }
        chunks
            .map(|pair| {
                let (low, high) = pair.split_at(width);
                T::read_le(low)
                    .zip(T::read_le(high))
                    .map(|(low, high)| [low, high])
                    .ok_or_else(|| tessel_err!("malformed {} range in subarray", T::DATATYPE))
            })
            .collect()
    }

    /// Encode per-dimension ranges into the byte form a query accepts.
    pub fn encode<T: CoordType>(ranges: &[[T; 2]]) -> Vec<u8> {
        let mut out = Vec::with_capacity(ranges.len() * 2 * T::DATATYPE.size());
        for [low, high] in ranges {
            low.write_le(&mut out);
            high.write_le(&mut out);
        }
        out
    }
}

impl AsRef<[u8]> for Subarray {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
