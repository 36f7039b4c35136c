use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use tessel_error::{TesselResult, tessel_bail, tessel_err};
use tessel_schema::{ArraySchema, ArrayType, Attribute, Compression, Domain, Layout};

use crate::{ArraySchemaBuilder, Context, RawArraySchema};

/// A shared handle to an array schema resource.
///
/// A handle is either *empty* or *loaded*. Cloning a loaded handle shares the underlying resource;
/// the resource is released to the context it was acquired from when the last clone is dropped.
/// Schemas under construction live in an [`ArraySchemaBuilder`] until they are created.
#[derive(Clone)]
pub struct ArraySchemaHandle {
    ctx: Context,
    raw: Option<Arc<RawArraySchema>>,
}

impl ArraySchemaHandle {
    /// An empty handle bound to `ctx`.
    pub fn new(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            raw: None,
        }
    }

    pub(crate) fn from_resource(ctx: &Context, raw: RawArraySchema) -> Self {
        Self {
            ctx: ctx.clone(),
            raw: Some(Arc::new(raw)),
        }
    }

    /// Take ownership of a resource produced by a raw call, leaving `raw` empty.
    ///
    /// The resource must have been acquired from `ctx`; otherwise `raw` is left untouched.
    pub fn from_raw(ctx: &Context, raw: &mut Option<RawArraySchema>) -> TesselResult<Self> {
        if let Some(resource) = raw.take_if(|resource| ctx.same_context(resource.context())) {
            return Ok(Self::from_resource(ctx, resource));
        }
        match raw {
            None => tessel_bail!(SchemaError: "cannot take an array schema from an empty slot"),
            Some(resource) => tessel_bail!(
                SchemaError: "array schema resource {} belongs to a different context",
                resource.id()
            ),
        }
    }

    /// Load the schema persisted at `uri` through `ctx`'s store.
    pub fn load(ctx: &Context, uri: &str) -> TesselResult<Self> {
        let mut out = None;
        ctx.handle_error(ctx.schema_load(uri, &mut out))?;
        Self::from_raw(ctx, &mut out)
    }

    /// Replace this handle's resource with the schema persisted at `uri`.
    ///
    /// On failure the handle keeps whatever it held before.
    pub fn reload(&mut self, uri: &str) -> TesselResult<()> {
        *self = Self::load(&self.ctx, uri)?;
        Ok(())
    }

    /// Start building a new schema in this handle's context.
    pub fn builder(&self, array_type: ArrayType) -> TesselResult<ArraySchemaBuilder> {
        ArraySchemaBuilder::new(&self.ctx, array_type)
    }

    /// Move the resource out, leaving this handle empty.
    pub fn take(&mut self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            raw: self.raw.take(),
        }
    }

    /// `true` when the handle holds **no** resource.
    pub fn good(&self) -> bool {
        self.raw.is_none()
    }

    pub fn is_loaded(&self) -> bool {
        self.raw.is_some()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn raw(&self) -> Option<&RawArraySchema> {
        self.raw.as_deref()
    }

    /// Number of handles sharing the resource, zero when empty.
    pub fn use_count(&self) -> usize {
        self.raw.as_ref().map_or(0, Arc::strong_count)
    }

    fn loaded(&self) -> TesselResult<&RawArraySchema> {
        self.raw
            .as_deref()
            .ok_or_else(|| tessel_err!(SchemaError: "array schema handle is empty"))
    }

    /// The schema, shared with every query resolved against it.
    pub fn schema(&self) -> TesselResult<Arc<ArraySchema>> {
        self.loaded().map(|raw| raw.schema().clone())
    }

    pub fn capacity(&self) -> TesselResult<u64> {
        Ok(self.loaded()?.schema().capacity())
    }

    pub fn tile_layout(&self) -> TesselResult<Layout> {
        Ok(self.loaded()?.schema().tile_order())
    }

    pub fn cell_layout(&self) -> TesselResult<Layout> {
        Ok(self.loaded()?.schema().cell_order())
    }

    pub fn coords_compressor(&self) -> TesselResult<Compression> {
        Ok(self.loaded()?.schema().coords_compression())
    }

    /// The URI the schema was created at or loaded from.
    pub fn name(&self) -> TesselResult<&str> {
        Ok(self.loaded()?.schema().name())
    }

    pub fn array_type(&self) -> TesselResult<ArrayType> {
        Ok(self.loaded()?.schema().array_type())
    }

    pub fn domain(&self) -> TesselResult<&Domain> {
        Ok(self.loaded()?.schema().domain())
    }

    /// Attributes keyed by name.
    pub fn attributes(&self) -> TesselResult<HashMap<String, Attribute>> {
        Ok(self
            .loaded()?
            .schema()
            .attributes()
            .iter()
            .map(|attr| (attr.name().to_string(), attr.clone()))
            .collect())
    }

    /// Re-validate the schema against the context's configuration.
    pub fn check(&self) -> TesselResult<()> {
        let raw = self.loaded()?;
        self.ctx.handle_error(self.ctx.schema_check(raw))
    }
}

impl Display for ArraySchemaHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.raw {
            Some(raw) => Display::fmt(raw.schema(), f),
            None => write!(f, "<empty array schema>"),
        }
    }
}

impl Debug for ArraySchemaHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArraySchemaHandle")
            .field("raw", &self.raw)
            .field("use_count", &self.use_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tessel_error::TesselError;
    use tessel_schema::{Compressor, Datatype, Dimension};

    use super::*;

    #[fixture]
    fn ctx() -> Context {
        Context::new()
    }

    fn create_sparse(ctx: &Context, uri: &str) -> ArraySchemaHandle {
        let mut builder = ArraySchemaBuilder::new(ctx, ArrayType::Sparse).unwrap();
        builder
            .add_dimension(Dimension::new("x", [1i64, 100], Some(10)).unwrap())
            .unwrap()
            .add_dimension(Dimension::new("y", [1i64, 100], Some(10)).unwrap())
            .unwrap()
            .add_attribute(Attribute::new("v", Datatype::Float32))
            .unwrap()
            .set_capacity(500)
            .unwrap()
            .set_coords_compressor(Compressor::Zstd)
            .unwrap();
        builder.create(uri).unwrap()
    }

    #[rstest]
    fn created_handle_is_loaded(ctx: Context) {
        let handle = create_sparse(&ctx, "mem://points");
        assert!(!handle.good());
        assert!(handle.is_loaded());
        assert_eq!(handle.name().unwrap(), "mem://points");
        assert_eq!(handle.capacity().unwrap(), 500);
        assert_eq!(handle.array_type().unwrap(), ArrayType::Sparse);
        assert_eq!(handle.tile_layout().unwrap(), Layout::RowMajor);
        assert_eq!(handle.cell_layout().unwrap(), Layout::RowMajor);
        assert_eq!(
            handle.coords_compressor().unwrap(),
            Compression::from(Compressor::Zstd)
        );
        assert_eq!(handle.domain().unwrap().ndim(), 2);
        assert!(handle.attributes().unwrap().contains_key("v"));
        handle.check().unwrap();
    }

    #[rstest]
    fn clones_share_one_release(ctx: Context) {
        let handle = create_sparse(&ctx, "mem://shared");
        let clone = handle.clone();
        assert_eq!(handle.use_count(), 2);
        assert_eq!(ctx.live_schemas(), 1);

        drop(handle);
        assert_eq!(ctx.schemas_released(), 0);
        assert_eq!(clone.capacity().unwrap(), 500);

        drop(clone);
        assert_eq!(ctx.schemas_released(), 1);
        assert_eq!(ctx.live_schemas(), 0);
    }

    #[rstest]
    fn take_leaves_source_empty(ctx: Context) {
        let mut handle = create_sparse(&ctx, "mem://taken");
        let taken = handle.take();
        assert!(handle.good());
        assert!(taken.is_loaded());
        assert_eq!(taken.use_count(), 1);
        drop(taken);
        assert_eq!(ctx.schemas_released(), 1);
    }

    #[rstest]
    fn empty_handle_queries_fail(ctx: Context) {
        let handle = ArraySchemaHandle::new(&ctx);
        assert!(handle.good());
        assert_eq!(handle.use_count(), 0);
        assert!(matches!(handle.capacity(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.tile_layout(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.cell_layout(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.coords_compressor(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.name(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.domain(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.attributes(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.schema(), Err(TesselError::SchemaError(..))));
        assert!(matches!(handle.check(), Err(TesselError::SchemaError(..))));
        assert_eq!(handle.to_string(), "<empty array schema>");
    }

    #[rstest]
    fn load_round_trip(ctx: Context) {
        let created = create_sparse(&ctx, "mem://persisted");
        let loaded = ArraySchemaHandle::load(&ctx, "mem://persisted").unwrap();
        assert_eq!(*loaded.schema().unwrap(), *created.schema().unwrap());
        assert_eq!(ctx.live_schemas(), 2);

        let mut reloaded = ArraySchemaHandle::new(&ctx);
        reloaded.reload("mem://persisted").unwrap();
        assert!(reloaded.is_loaded());
        assert!(reloaded.reload("mem://missing").is_err());
        assert!(reloaded.is_loaded());
    }

    #[rstest]
    fn from_raw_takes_the_slot(ctx: Context) {
        let mut slot = None;
        ctx.handle_error(ctx.schema_alloc(ArrayType::Dense, &mut slot))
            .unwrap();
        let handle = ArraySchemaHandle::from_raw(&ctx, &mut slot).unwrap();
        assert!(slot.is_none());
        assert!(handle.is_loaded());

        let err = ArraySchemaHandle::from_raw(&ctx, &mut slot).unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));
    }

    #[rstest]
    fn from_raw_rejects_foreign_context(ctx: Context) {
        let other = Context::new();
        let mut slot = None;
        other
            .handle_error(other.schema_alloc(ArrayType::Dense, &mut slot))
            .unwrap();
        let err = ArraySchemaHandle::from_raw(&ctx, &mut slot).unwrap_err();
        assert!(err.message().contains("different context"));
        assert!(slot.is_some());
        assert_eq!(other.live_schemas(), 1);

        drop(slot);
        assert_eq!(other.live_schemas(), 0);
        assert_eq!(ctx.schemas_released(), 0);
    }

    #[rstest]
    fn display_summarises_schema(ctx: Context) {
        let handle = create_sparse(&ctx, "mem://shown");
        let text = handle.to_string();
        assert!(text.contains("mem://shown"));
        assert!(text.contains("v"));
    }
}
