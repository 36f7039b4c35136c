use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use tessel_error::{TesselResult, tessel_bail, tessel_err};

use crate::{ArrayType, Attribute, AttributeId, Compression, Config, Dimension, Domain, Layout};

/// Metadata describing an array: its domain, its attributes and how cells are laid out.
///
/// An `ArraySchema` is mutable while it is being assembled and is shared read-only (behind an
/// `Arc`) once it has been created or loaded. All of the queries used to resolve a query plan
/// are pure and cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArraySchema {
    #[cfg_attr(feature = "serde", serde(skip))]
    name: String,
    array_type: ArrayType,
    domain: Domain,
    attributes: Vec<Attribute>,
    capacity: u64,
    tile_order: Layout,
    cell_order: Layout,
    coords_compression: Compression,
}

impl ArraySchema {
    /// Default number of cells per data tile of a sparse array.
    pub const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(array_type: ArrayType) -> Self {
        Self {
            name: String::new(),
            array_type,
            domain: Domain::new(),
            attributes: Vec::new(),
            capacity: Self::DEFAULT_CAPACITY,
            tile_order: Layout::RowMajor,
            cell_order: Layout::RowMajor,
            coords_compression: Compression::NONE,
        }
    }

    /// The URI this schema was created at or loaded from; empty while it is being built.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn array_type(&self) -> ArrayType {
        self.array_type
    }

    pub fn is_dense(&self) -> bool {
        self.array_type.is_dense()
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Replace the domain.
    pub fn set_domain(&mut self, domain: Domain) {
        self.domain = domain;
    }

    /// Append a dimension to the current domain.
    pub fn add_dimension(&mut self, dimension: Dimension) -> TesselResult<()> {
        self.domain.add_dimension(dimension)?;
        Ok(())
    }

    /// Append an attribute. Attribute names are unique and may not shadow the coordinates name.
    pub fn add_attribute(&mut self, attribute: Attribute, config: &Config) -> TesselResult<()> {
        attribute.check(config)?;
        if self.attribute_index(attribute.name()).is_some() {
            tessel_bail!(
                SchemaError: "cannot add attribute: duplicate attribute name '{}'",
                attribute.name()
            );
        }
        self.attributes.push(attribute);
        Ok(())
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// The attribute behind `id`. The coordinates pseudo-attribute has no [`Attribute`].
    pub fn attribute(&self, id: AttributeId) -> TesselResult<&Attribute> {
        match id {
            AttributeId::Attribute(idx) => self.attributes.get(idx).ok_or_else(|| {
                tessel_err!(
                    SchemaError: "attribute id {idx} out of range for {} attributes",
                    self.attributes.len()
                )
            }),
            AttributeId::Coordinates => {
                tessel_bail!(
                    SchemaError: "the coordinates pseudo-attribute has no attribute descriptor"
                )
            }
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: u64) -> TesselResult<()> {
        if capacity == 0 {
            tessel_bail!(SchemaError: "tile capacity must be positive");
        }
        self.capacity = capacity;
        Ok(())
    }

    pub fn tile_order(&self) -> Layout {
        self.tile_order
    }

    pub fn set_tile_order(&mut self, layout: Layout) -> TesselResult<()> {
        if !layout.is_schema_order() {
            tessel_bail!(SchemaError: "invalid tile order {layout}");
        }
        self.tile_order = layout;
        Ok(())
    }

    pub fn cell_order(&self) -> Layout {
        self.cell_order
    }

    pub fn set_cell_order(&mut self, layout: Layout) -> TesselResult<()> {
        if !layout.is_schema_order() {
            tessel_bail!(SchemaError: "invalid cell order {layout}");
        }
        self.cell_order = layout;
        Ok(())
    }

    pub fn coords_compression(&self) -> Compression {
        self.coords_compression
    }

    pub fn set_coords_compression<C: Into<Compression>>(&mut self, compression: C) {
        self.coords_compression = compression.into();
    }

    /// Size in bytes of one cell's coordinates. Zero until the domain has a dimension.
    pub fn coords_size(&self) -> u64 {
        self.domain.coords_size()
    }

    /// Whether the attribute behind `id` has variable-sized cells. Coordinates never do.
    pub fn is_variable_size(&self, id: AttributeId) -> TesselResult<bool> {
        match id {
            AttributeId::Coordinates => Ok(false),
            id => self.attribute(id).map(Attribute::is_var),
        }
    }

    /// Every attribute name in schema order, followed by the coordinates name.
    pub fn attribute_names<'a>(&'a self, config: &'a Config) -> Vec<&'a str> {
        self.attributes
            .iter()
            .map(Attribute::name)
            .chain([config.coords_name()])
            .collect()
    }

    /// The full domain, used as the sub-region of a query that names none.
    pub fn domain_bytes(&self) -> TesselResult<Vec<u8>> {
        if self.domain.is_empty() {
            tessel_bail!(SchemaError: "array schema has no domain");
        }
        Ok(self.domain.domain_bytes())
    }

    /// Map attribute names to ids, preserving order. The coordinates name maps to
    /// [`AttributeId::Coordinates`].
    pub fn resolve_attribute_ids<S: AsRef<str>>(
        &self,
        names: &[S],
        config: &Config,
    ) -> TesselResult<Vec<AttributeId>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                if name == config.coords_name() {
                    return Ok(AttributeId::Coordinates);
                }
                self.attribute_index(name)
                    .map(AttributeId::Attribute)
                    .ok_or_else(|| tessel_err!(SchemaError: "invalid attribute name '{name}'"))
            })
            .collect()
    }

    fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    /// Validate the whole schema. Run before a schema is persisted and after it is loaded.
    pub fn check(&self, config: &Config) -> TesselResult<()> {
        self.domain.check(config)?;

        if self.is_dense() && self.domain.datatype().is_some_and(|dt| !dt.is_integer()) {
            tessel_bail!(SchemaError: "dense arrays require integer coordinates");
        }

        let mut names = HashSet::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            attribute.check(config)?;
            if !names.insert(attribute.name()) {
                tessel_bail!(SchemaError: "duplicate attribute name '{}'", attribute.name());
            }
        }

        if self.domain.dimensions().iter().any(|d| names.contains(d.name())) {
            tessel_bail!(SchemaError: "attribute and dimension names must be distinct");
        }
        if self.capacity == 0 {
            tessel_bail!(SchemaError: "tile capacity must be positive");
        }
        if !self.tile_order.is_schema_order() || !self.cell_order.is_schema_order() {
            tessel_bail!(SchemaError: "tile and cell order must be row-major or col-major");
        }
        Ok(())
    }
}

impl Display for ArraySchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = if self.name.is_empty() { "<unnamed>" } else { self.name.as_str() };
        writeln!(f, "ArraySchema<{} {name}>", self.array_type)?;
        writeln!(f, "  domain: {}", self.domain)?;
        writeln!(f, "  attributes: [{}]", self.attributes.iter().join(", "))?;
        writeln!(
            f,
            "  capacity: {}, tile order: {}, cell order: {}",
            self.capacity, self.tile_order, self.cell_order
        )?;
        write!(f, "  coords compression: {}", self.coords_compression)
    }
}
