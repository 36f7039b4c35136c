use tessel_error::{TesselResult, tessel_err};
use tessel_schema::{ArraySchema, ArrayType, Attribute, Compression, Dimension, Domain, Layout};

use crate::{ArraySchemaHandle, Context, RawArraySchema, Status};

/// Assembles a new array schema.
///
/// Every step is applied to the underlying resource immediately, so a rejected step (for example
/// a duplicate dimension or attribute name) fails at the call that caused it and leaves the
/// schema as it was.
///
/// ```
/// use tessel_context::{ArraySchemaBuilder, Context};
/// use tessel_schema::{ArrayType, Attribute, Datatype, Dimension};
///
/// let ctx = Context::new();
/// let mut builder = ArraySchemaBuilder::new(&ctx, ArrayType::Dense)?;
/// builder
///     .add_dimension(Dimension::new("rows", [1i32, 4], Some(2))?)?
///     .add_attribute(Attribute::new("a", Datatype::Int32))?;
/// let handle = builder.create("mem://doc/dense")?;
/// assert!(handle.is_loaded());
/// # Ok::<(), tessel_error::TesselError>(())
/// ```
#[derive(Debug)]
pub struct ArraySchemaBuilder {
    ctx: Context,
    raw: RawArraySchema,
}

impl ArraySchemaBuilder {
    pub fn new(ctx: &Context, array_type: ArrayType) -> TesselResult<Self> {
        let mut out = None;
        ctx.handle_error(ctx.schema_alloc(array_type, &mut out))?;
        let raw = out
            .ok_or_else(|| tessel_err!(SchemaError: "schema allocation produced no resource"))?;
        Ok(Self {
            ctx: ctx.clone(),
            raw,
        })
    }

    fn apply<F>(&mut self, f: F) -> TesselResult<&mut Self>
    where
        F: FnOnce(&Context, &mut RawArraySchema) -> Status,
    {
        let status = f(&self.ctx, &mut self.raw);
        self.ctx.handle_error(status)?;
        Ok(self)
    }

    /// Replace the whole domain.
    pub fn set_domain(&mut self, domain: Domain) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_set_domain(raw, &domain))
    }

    /// Append a dimension to the domain.
    pub fn add_dimension(&mut self, dimension: Dimension) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_add_dimension(raw, &dimension))
    }

    pub fn add_attribute(&mut self, attribute: Attribute) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_add_attribute(raw, &attribute))
    }

    pub fn set_capacity(&mut self, capacity: u64) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_set_capacity(raw, capacity))
    }

    pub fn set_tile_order(&mut self, layout: Layout) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_set_tile_order(raw, layout))
    }

    pub fn set_cell_order(&mut self, layout: Layout) -> TesselResult<&mut Self> {
        self.apply(|ctx, raw| ctx.schema_set_cell_order(raw, layout))
    }

    pub fn set_coords_compressor<C: Into<Compression>>(
        &mut self,
        compression: C,
    ) -> TesselResult<&mut Self> {
        let compression = compression.into();
        self.apply(|ctx, raw| ctx.schema_set_coords_compression(raw, compression))
    }

    /// The schema as assembled so far.
    pub fn schema(&self) -> &ArraySchema {
        self.raw.schema()
    }

    pub fn check(&self) -> TesselResult<()> {
        self.ctx.handle_error(self.ctx.schema_check(&self.raw))
    }

    /// Validate the schema, persist it at `uri` and hand it over to a loaded handle.
    pub fn create(mut self, uri: &str) -> TesselResult<ArraySchemaHandle> {
        self.ctx
            .handle_error(self.ctx.schema_create(&mut self.raw, uri))?;
        Ok(ArraySchemaHandle::from_resource(&self.ctx, self.raw))
    }
}
