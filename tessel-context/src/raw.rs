use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tessel_error::{ResultExt, TesselResult, tessel_bail};
use tessel_schema::{ArraySchema, ArrayType, Attribute, Compression, Dimension, Domain, Layout};

use crate::{Context, Status};

/// A schema resource acquired from a [`Context`].
///
/// The resource remembers the context it was acquired from and releases itself back to that
/// context when dropped, so the release path travels with the resource no matter who ends up
/// owning it.
pub struct RawArraySchema {
    ctx: Context,
    id: u64,
    schema: Arc<ArraySchema>,
}

impl RawArraySchema {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The context this resource is released to.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn schema(&self) -> &Arc<ArraySchema> {
        &self.schema
    }

    fn schema_mut(&mut self) -> &mut ArraySchema {
        Arc::make_mut(&mut self.schema)
    }
}

impl Drop for RawArraySchema {
    fn drop(&mut self) {
        self.ctx.schema_free(self);
    }
}

impl Debug for RawArraySchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawArraySchema")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .finish()
    }
}

/// The raw schema API.
///
/// Each call reports its outcome as a [`Status`]; on failure the error is recorded on the
/// context and surfaces through [`Context::handle_error`].
impl Context {
    fn acquire(&self, schema: ArraySchema) -> RawArraySchema {
        let id = self.acquire_schema_id();
        log::trace!("acquired array schema resource {id}");
        RawArraySchema {
            ctx: self.clone(),
            id,
            schema: Arc::new(schema),
        }
    }

    /// Release a resource. Only ever called from [`RawArraySchema`]'s destructor.
    fn schema_free(&self, raw: &RawArraySchema) {
        self.release_schema_id(raw.id);
    }

    fn check_owner(&self, raw: &RawArraySchema) -> TesselResult<()> {
        if !self.same_context(&raw.ctx) {
            tessel_bail!(
                SchemaError: "array schema resource {} belongs to a different context",
                raw.id
            );
        }
        Ok(())
    }

    fn mutate<F>(&self, raw: &mut RawArraySchema, f: F) -> Status
    where
        F: FnOnce(&Context, &mut ArraySchema) -> TesselResult<()>,
    {
        let result = self.check_owner(raw).and_then(|()| f(self, raw.schema_mut()));
        self.record(result)
    }

    /// Allocate an empty schema resource into `out`.
    pub fn schema_alloc(&self, array_type: ArrayType, out: &mut Option<RawArraySchema>) -> Status {
        *out = Some(self.acquire(ArraySchema::new(array_type)));
        Status::Ok
    }

    pub fn schema_set_domain(&self, raw: &mut RawArraySchema, domain: &Domain) -> Status {
        self.mutate(raw, |ctx, schema| {
            domain.check(ctx.config())?;
            schema.set_domain(domain.clone());
            Ok(())
        })
    }

    pub fn schema_add_dimension(&self, raw: &mut RawArraySchema, dimension: &Dimension) -> Status {
        self.mutate(raw, |ctx, schema| {
            dimension.check(ctx.config())?;
            schema.add_dimension(dimension.clone())
        })
    }

    pub fn schema_add_attribute(&self, raw: &mut RawArraySchema, attribute: &Attribute) -> Status {
        self.mutate(raw, |ctx, schema| {
            schema.add_attribute(attribute.clone(), ctx.config())
        })
    }

    pub fn schema_set_capacity(&self, raw: &mut RawArraySchema, capacity: u64) -> Status {
        self.mutate(raw, |_, schema| schema.set_capacity(capacity))
    }

    pub fn schema_set_tile_order(&self, raw: &mut RawArraySchema, layout: Layout) -> Status {
        self.mutate(raw, |_, schema| schema.set_tile_order(layout))
    }

    pub fn schema_set_cell_order(&self, raw: &mut RawArraySchema, layout: Layout) -> Status {
        self.mutate(raw, |_, schema| schema.set_cell_order(layout))
    }

    pub fn schema_set_coords_compression(
        &self,
        raw: &mut RawArraySchema,
        compression: Compression,
    ) -> Status {
        self.mutate(raw, |_, schema| {
            schema.set_coords_compression(compression);
            Ok(())
        })
    }

    pub fn schema_check(&self, raw: &RawArraySchema) -> Status {
        self.record(raw.schema.check(self.config()))
    }

    /// Validate the schema and persist it at `uri`. On success the schema is named after `uri`.
    pub fn schema_create(&self, raw: &mut RawArraySchema, uri: &str) -> Status {
        self.mutate(raw, |ctx, schema| {
            schema.check(ctx.config())?;
            ctx.store()
                .create(uri, schema)
                .with_context(|| format!("failed to create array schema at '{uri}'"))?;
            schema.set_name(uri);
            log::debug!("created {} array schema at {uri}", schema.array_type());
            Ok(())
        })
    }

    /// Load the schema persisted at `uri` into `out`. `out` is left untouched on failure.
    pub fn schema_load(&self, uri: &str, out: &mut Option<RawArraySchema>) -> Status {
        let result = self
            .store()
            .load(uri)
            .and_then(|mut schema| {
                schema.check(self.config())?;
                schema.set_name(uri);
                Ok(schema)
            })
            .with_context(|| format!("failed to load array schema from '{uri}'"));
        match result {
            Ok(schema) => {
                log::debug!("loaded {} array schema from {uri}", schema.array_type());
                *out = Some(self.acquire(schema));
                Status::Ok
            }
            Err(err) => self.record(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tessel_error::TesselError;
    use tessel_schema::Datatype;

    use super::*;

    fn alloc(ctx: &Context, array_type: ArrayType) -> RawArraySchema {
        let mut out = None;
        ctx.handle_error(ctx.schema_alloc(array_type, &mut out)).unwrap();
        out.unwrap()
    }

    #[test]
    fn drop_releases_to_owning_context() {
        let ctx = Context::new();
        let raw = alloc(&ctx, ArrayType::Sparse);
        assert_eq!(ctx.live_schemas(), 1);
        drop(raw);
        assert_eq!(ctx.live_schemas(), 0);
        assert_eq!(ctx.schemas_released(), 1);
    }

    #[test]
    fn mutation_errors_are_recorded() {
        let ctx = Context::new();
        let mut raw = alloc(&ctx, ArrayType::Dense);
        let attr = Attribute::new("a", Datatype::Int32);
        ctx.handle_error(ctx.schema_add_attribute(&mut raw, &attr))
            .unwrap();

        let status = ctx.schema_add_attribute(&mut raw, &attr);
        assert_eq!(status, Status::Err);
        let err = ctx.handle_error(status).unwrap_err();
        assert!(matches!(err, TesselError::SchemaError(..)));
        assert_eq!(raw.schema().attribute_count(), 1);
    }

    #[test]
    fn foreign_resource_rejected() {
        let ctx = Context::new();
        let other = Context::new();
        let mut raw = alloc(&other, ArrayType::Dense);
        let status = ctx.schema_set_capacity(&mut raw, 10);
        assert!(ctx.handle_error(status).is_err());
        drop(raw);
        assert_eq!(other.schemas_released(), 1);
        assert_eq!(ctx.schemas_released(), 0);
    }

    #[test]
    fn load_missing_leaves_out_untouched() {
        let ctx = Context::new();
        let mut out = None;
        let status = ctx.schema_load("mem://missing", &mut out);
        assert!(ctx.handle_error(status).is_err());
        assert!(out.is_none());
        assert_eq!(ctx.live_schemas(), 0);
    }

    #[test]
    fn concurrent_raw_calls_surface_their_own_errors() {
        let ctx = Context::new();
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let writer = {
            let ctx = ctx.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                let mut raw = alloc(&ctx, ArrayType::Sparse);
                let attr = Attribute::new("a", Datatype::Int32);
                ctx.handle_error(ctx.schema_add_attribute(&mut raw, &attr))
                    .unwrap();
                barrier.wait();
                for _ in 0..2_000 {
                    let err = ctx
                        .handle_error(ctx.schema_add_attribute(&mut raw, &attr))
                        .unwrap_err();
                    assert!(matches!(err.root(), TesselError::SchemaError(..)));
                }
            })
        };
        let loader = {
            let ctx = ctx.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                for _ in 0..2_000 {
                    let mut out = None;
                    let err = ctx
                        .handle_error(ctx.schema_load("s3://bucket/array", &mut out))
                        .unwrap_err();
                    assert!(matches!(err.root(), TesselError::InvalidArgument(..)));
                }
            })
        };

        writer.join().unwrap();
        loader.join().unwrap();
        assert_eq!(ctx.live_schemas(), 0);
    }
}
