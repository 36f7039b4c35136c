use std::sync::Arc;

use itertools::Itertools;
use tessel_error::{TesselResult, tessel_err};
use tessel_schema::{ArraySchema, AttributeId, Config};

use crate::{QueryMode, Subarray, resolve, resolve_subarray};

/// The buffers the execution engine exchanges for one resolved attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlots {
    /// Fixed-size cells use a single buffer.
    Fixed(usize),
    /// Variable-size cells use an offsets buffer followed by a data buffer.
    Var { offsets: usize, data: usize },
}

impl BufferSlots {
    /// The first slot used by the attribute.
    pub fn first(&self) -> usize {
        match self {
            BufferSlots::Fixed(slot) => *slot,
            BufferSlots::Var { offsets, .. } => *offsets,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            BufferSlots::Fixed(_) => 1,
            BufferSlots::Var { .. } => 2,
        }
    }
}

/// A resolved query: which attributes, in which order, over which sub-region.
///
/// The attribute order and the mode are fixed at construction. Only the sub-region can be
/// re-bound afterwards.
#[derive(Debug)]
pub struct Query {
    schema: Arc<ArraySchema>,
    mode: QueryMode,
    attribute_ids: Vec<AttributeId>,
    subarray: Option<Subarray>,
}

impl Query {
    /// Resolve a query against `schema`.
    ///
    /// `attributes` selects the attributes to touch, defaulting to all of them, and `subarray`
    /// the region to cover, defaulting to the whole domain. A query that fails to resolve is
    /// never constructed.
    pub fn try_new(
        schema: Arc<ArraySchema>,
        mode: QueryMode,
        attributes: Option<&[&str]>,
        subarray: Option<&[u8]>,
        config: &Config,
    ) -> TesselResult<Self> {
        let (attribute_ids, subarray) = resolve(&schema, mode, attributes, subarray, config)?;
        log::debug!(
            "resolved {mode} query on {} array '{}': attributes [{}]",
            schema.array_type(),
            schema.name(),
            attribute_ids.iter().join(", ")
        );
        Ok(Self {
            schema,
            mode,
            attribute_ids,
            subarray: Some(subarray),
        })
    }

    pub fn schema(&self) -> &Arc<ArraySchema> {
        &self.schema
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    pub fn attribute_ids(&self) -> &[AttributeId] {
        &self.attribute_ids
    }

    /// The attribute ids in the engine's integer form, where the coordinates are encoded as the
    /// schema's attribute count.
    pub fn raw_attribute_ids(&self) -> Vec<usize> {
        let count = self.schema.attribute_count();
        self.attribute_ids.iter().map(|id| id.to_raw(count)).collect()
    }

    /// The bytes of the current sub-region.
    pub fn subarray(&self) -> TesselResult<&[u8]> {
        self.subarray
            .as_ref()
            .map(Subarray::as_bytes)
            .ok_or_else(|| tessel_err!(QueryError: "query has no subarray; it was released"))
    }

    /// Point the query at a new sub-region, or back at the whole domain with `None`.
    ///
    /// The existing buffer is overwritten in place. A query whose buffer was released gets a new
    /// one. On failure the previous sub-region is kept.
    pub fn rebind_subarray(&mut self, subarray: Option<&[u8]>) -> TesselResult<()> {
        match self.subarray.as_mut() {
            Some(buffer) => match subarray {
                Some(bytes) => buffer.fill_from(bytes),
                None => buffer.fill_from(&self.schema.domain_bytes()?),
            },
            None => {
                self.subarray = Some(resolve_subarray(&self.schema, subarray)?);
                Ok(())
            }
        }
    }

    /// Hand the sub-region buffer to the caller, leaving the query without one until the next
    /// [`Query::rebind_subarray`].
    pub fn release_subarray(&mut self) -> Option<Subarray> {
        self.subarray.take()
    }

    /// The buffer slots of every resolved attribute, in attribute order.
    pub fn buffer_slots(&self) -> TesselResult<Vec<BufferSlots>> {
        let mut next = 0;
        self.attribute_ids
            .iter()
            .map(|id| {
                let slots = if self.schema.is_variable_size(*id)? {
                    BufferSlots::Var {
                        offsets: next,
                        data: next + 1,
                    }
                } else {
                    BufferSlots::Fixed(next)
                };
                next += slots.count();
                Ok(slots)
            })
            .collect()
    }

    /// The total number of buffers the execution engine must be handed.
    pub fn buffer_count(&self) -> TesselResult<usize> {
        Ok(self.buffer_slots()?.iter().map(BufferSlots::count).sum())
    }

    /// The position of the coordinates buffer among the query's buffers.
    pub fn coords_buffer_index(&self) -> TesselResult<usize> {
        let mut coords = None;
        for (id, slots) in self.attribute_ids.iter().zip(self.buffer_slots()?) {
            if id.is_coordinates() {
                coords = Some(slots.first());
                break;
            }
        }
        coords.ok_or_else(|| tessel_err!(ArrayError: "Cannot find coordinates buffer index"))
    }
}
