use std::fmt::{Display, Formatter};

use itertools::Itertools;
use tessel_error::{TesselError, TesselResult, tessel_bail};

use crate::{Config, Datatype, Dimension};

/// An ordered list of dimensions sharing a single coordinate datatype.
///
/// The per-cell coordinate size (`ndim × datatype width`) is computed as dimensions are added
/// and cached, so schemas never recompute it per query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<Dimension>", into = "Vec<Dimension>")
)]
pub struct Domain {
    dimensions: Vec<Dimension>,
    coords_size: u64,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dimension. Names must be unique and every dimension must share the datatype of
    /// the first one.
    pub fn add_dimension(&mut self, dimension: Dimension) -> TesselResult<&mut Self> {
        if self.dimension(dimension.name()).is_some() {
            tessel_bail!(
                SchemaError: "cannot add dimension: duplicate dimension name '{}'",
                dimension.name()
            );
        }
        if let Some(datatype) = self.datatype() {
            if datatype != dimension.datatype() {
                tessel_bail!(
                    SchemaError: "cannot add dimension '{}' of type {}: domain has type {datatype}",
                    dimension.name(),
                    dimension.datatype()
                );
            }
        }
        self.coords_size += dimension.datatype().size() as u64;
        self.dimensions.push(dimension);
        Ok(self)
    }

    /// Chaining form of [`Domain::add_dimension`].
    pub fn with_dimension(mut self, dimension: Dimension) -> TesselResult<Self> {
        self.add_dimension(dimension)?;
        Ok(self)
    }

    /// The coordinate datatype, or `None` while the domain has no dimensions.
    pub fn datatype(&self) -> Option<Datatype> {
        self.dimensions.first().map(Dimension::datatype)
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name() == name)
    }

    /// Size in bytes of one cell's coordinates.
    pub fn coords_size(&self) -> u64 {
        self.coords_size
    }

    /// The full domain as a sub-region: each dimension's `(low, high)` pair, in order.
    pub fn domain_bytes(&self) -> Vec<u8> {
        self.dimensions
            .iter()
            .flat_map(|d| d.domain_bytes().iter().copied())
            .collect()
    }

    pub fn check(&self, config: &Config) -> TesselResult<()> {
        if self.dimensions.is_empty() {
            tessel_bail!(SchemaError: "domain must have at least one dimension");
        }
        for dimension in &self.dimensions {
            dimension.check(config)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<Dimension>> for Domain {
    type Error = TesselError;

    fn try_from(dimensions: Vec<Dimension>) -> Result<Self, Self::Error> {
        dimensions
            .into_iter()
            .try_fold(Domain::new(), |domain, dim| domain.with_dimension(dim))
    }
}

impl From<Domain> for Vec<Dimension> {
    fn from(domain: Domain) -> Self {
        domain.dimensions
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.dimensions.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use tessel_error::TesselError;

    use super::*;

    fn rows_cols() -> Domain {
        Domain::new()
            .with_dimension(Dimension::new("rows", [1i32, 4], Some(2)).unwrap())
            .unwrap()
            .with_dimension(Dimension::new("cols", [1i32, 8], Some(4)).unwrap())
            .unwrap()
    }

    #[test]
    fn coords_size_tracks_dimensions() {
        let domain = rows_cols();
        assert_eq!(domain.ndim(), 2);
        assert_eq!(domain.coords_size(), 8);
        assert_eq!(domain.datatype(), Some(Datatype::Int32));
    }

    #[test]
    fn domain_bytes_concatenate_pairs() {
        let domain = rows_cols();
        assert_eq!(
            domain.domain_bytes(),
            vec![1, 0, 0, 0, 4, 0, 0, 0, 1, 0, 0, 0, 8, 0, 0, 0]
        );
        assert_eq!(domain.domain_bytes().len() as u64, 2 * domain.coords_size());
    }

    #[test]
    fn duplicate_dimension_rejected() {
        let mut domain = rows_cols();
        let err = domain
            .add_dimension(Dimension::new("rows", [0i32, 1], None).unwrap())
            .unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));
        assert_eq!(domain.ndim(), 2);
    }

    #[test]
    fn mixed_types_rejected() {
        let mut domain = rows_cols();
        assert!(
            domain
                .add_dimension(Dimension::new("z", [0i64, 1], None).unwrap())
                .is_err()
        );
    }

    #[test]
    fn empty_domain_fails_check() {
        assert!(Domain::new().check(&Config::default()).is_err());
        assert!(rows_cols().check(&Config::default()).is_ok());
    }

    #[test]
    fn display() {
        assert_eq!(
            rows_cols().to_string(),
            "{rows: i32 [1, 4] tile 2, cols: i32 [1, 8] tile 4}"
        );
    }
}
