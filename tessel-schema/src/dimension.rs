use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use tessel_error::{TesselResult, tessel_bail, tessel_err};

use crate::{Config, CoordType, Datatype, match_each_coord_type};

/// A named axis of an array domain, bounded by a closed `[low, high]` range.
///
/// The bounds (and the optional tile extent) are kept in their little-endian byte form, the
/// same form in which they are concatenated into the domain and into sub-regions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    name: String,
    datatype: Datatype,
    domain: Vec<u8>,
    tile_extent: Option<Vec<u8>>,
}

impl Dimension {
    /// Create a dimension over `[domain[0], domain[1]]` with an optional tile extent.
    pub fn new<T: CoordType>(
        name: impl Into<String>,
        domain: [T; 2],
        tile_extent: Option<T>,
    ) -> TesselResult<Self> {
        let name = name.into();
        let [low, high] = domain;
        if !is_ordered(low, high) {
            tessel_bail!(SchemaError: "dimension {name}: invalid bounds [{low}, {high}]");
        }
        if let Some(extent) = tile_extent {
            if !extent.is_positive() {
                tessel_bail!(
                    SchemaError: "dimension {name}: tile extent {extent} must be positive"
                );
            }
            if !T::extent_fits(low, high, extent) {
                tessel_bail!(
                    SchemaError: "dimension {name}: tile extent {extent} exceeds [{low}, {high}]"
                );
            }
        }

        let mut bytes = Vec::with_capacity(2 * size_of::<T>());
        low.write_le(&mut bytes);
        high.write_le(&mut bytes);

        Ok(Self {
            name,
            datatype: T::DATATYPE,
            domain: bytes,
            tile_extent: tile_extent.map(|extent| {
                let mut bytes = Vec::with_capacity(size_of::<T>());
                extent.write_le(&mut bytes);
                bytes
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The `(low, high)` pair as little-endian bytes, `2 × datatype.size()` long.
    pub fn domain_bytes(&self) -> &[u8] {
        &self.domain
    }

    /// The typed `[low, high]` bounds.
    pub fn domain<T: CoordType>(&self) -> TesselResult<[T; 2]> {
        self.check_type::<T>()?;
        let width = self.datatype.size();
        let low = self.domain.get(..width).and_then(T::read_le);
        let high = self.domain.get(width..).and_then(T::read_le);
        low.zip(high)
            .map(|(low, high)| [low, high])
            .ok_or_else(|| {
                tessel_err!(SchemaError: "dimension {} has a malformed domain", self.name)
            })
    }

    /// The typed tile extent, if one was set.
    pub fn tile_extent<T: CoordType>(&self) -> TesselResult<Option<T>> {
        self.check_type::<T>()?;
        self.tile_extent
            .as_deref()
            .map(|bytes| {
                T::read_le(bytes).ok_or_else(|| {
                    tessel_err!(
                        SchemaError: "dimension {} has a malformed tile extent",
                        self.name
                    )
                })
            })
            .transpose()
    }

    /// Validate the dimension against the naming rules of `config` and its own byte layout.
    ///
    /// Dimensions built through [`Dimension::new`] always satisfy the layout rules; the check
    /// matters for dimensions that were deserialized.
    pub fn check(&self, config: &Config) -> TesselResult<()> {
        if !config.is_valid_name(&self.name) {
            tessel_bail!(SchemaError: "invalid dimension name length: '{}'", self.name);
        }
        if !self.datatype.is_coordinate() {
            tessel_bail!(
                SchemaError: "dimension {} has non-coordinate type {}",
                self.name,
                self.datatype
            );
        }
        if self.domain.len() != 2 * self.datatype.size() {
            tessel_bail!(SchemaError: "dimension {} has a malformed domain", self.name);
        }
        match_each_coord_type!(self.datatype, |T| {
            let [low, high] = self.domain::<T>()?;
            if !is_ordered(low, high) {
                tessel_bail!(
                    SchemaError: "dimension {}: invalid bounds [{low}, {high}]",
                    self.name
                );
            }
            if let Some(extent) = self.tile_extent::<T>()? {
                if !extent.is_positive() || !T::extent_fits(low, high, extent) {
                    tessel_bail!(
                        SchemaError: "dimension {}: invalid tile extent {extent}",
                        self.name
                    );
                }
            }
        });
        Ok(())
    }

    fn check_type<T: CoordType>(&self) -> TesselResult<()> {
        if T::DATATYPE != self.datatype {
            tessel_bail!(
                SchemaError: "dimension {} has type {}, requested {}",
                self.name,
                self.datatype,
                T::DATATYPE
            );
        }
        Ok(())
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match_each_coord_type!(self.datatype, |T| {
            let width = self.datatype.size();
            let low = self.domain.get(..width).and_then(T::read_le);
            let high = self.domain.get(width..).and_then(T::read_le);
            match (low, high) {
                (Some(low), Some(high)) => {
                    write!(f, "{}: {} [{low}, {high}]", self.name, self.datatype)?
                }
                _ => write!(f, "{}: {} [?]", self.name, self.datatype)?,
            }
            if let Some(extent) = self.tile_extent.as_deref().and_then(T::read_le) {
                write!(f, " tile {extent}")?;
            }
        });
        Ok(())
    }
}

/// `low <= high`. Unordered bounds such as NaN never form a range.
fn is_ordered<T: CoordType>(low: T, high: T) -> bool {
    matches!(
        low.partial_cmp(&high),
        Some(Ordering::Less | Ordering::Equal)
    )
}
