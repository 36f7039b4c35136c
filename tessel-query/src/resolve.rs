//! Resolution of a query declaration into its positional plan.

use itertools::Itertools;
use tessel_error::{TesselResult, tessel_bail, tessel_err};
use tessel_schema::{ArraySchema, AttributeId, Config};

use crate::{QueryMode, Subarray};

/// Resolve the attributes a query touches, in the order the execution engine will see them.
///
/// Without an explicit list every attribute is used; dense arrays leave the coordinates out
/// unless cells are written unsorted. An explicit list keeps the caller's order, and sparse
/// arrays always get the coordinates appended if the caller did not ask for them.
pub fn resolve_attributes(
    schema: &ArraySchema,
    mode: QueryMode,
    attributes: Option<&[&str]>,
    config: &Config,
) -> TesselResult<Vec<AttributeId>> {
    let names: Vec<&str> = match attributes {
        None => {
            let mut names = schema.attribute_names(config);
            if schema.is_dense() && mode != QueryMode::WriteUnsorted {
                names.pop();
            }
            names
        }
        Some(attributes) => {
            if let Some(name) = attributes.iter().find(|name| !config.is_valid_name(name)) {
                log::debug!(
                    "rejecting attribute name of length {} (max {})",
                    name.len(),
                    config.name_max_len()
                );
                tessel_bail!(QueryError: "Invalid attribute name length");
            }
            let mut names = attributes.to_vec();
            if !schema.is_dense() && !names.contains(&config.coords_name()) {
                names.push(config.coords_name());
            }
            names
        }
    };

    if let Some(duplicate) = names.iter().duplicates().next() {
        tessel_bail!(QueryError: "Cannot initialize query; duplicate attribute '{duplicate}'");
    }

    schema.resolve_attribute_ids(&names, config)
}

/// Allocate the sub-region buffer and fill it from `subarray`, or from the full domain.
pub fn resolve_subarray(schema: &ArraySchema, subarray: Option<&[u8]>) -> TesselResult<Subarray> {
    if schema.coords_size() == 0 {
        tessel_bail!(SchemaError: "array schema has no domain");
    }
    let len = schema
        .coords_size()
        .checked_mul(2)
        .and_then(|len| usize::try_from(len).ok())
        .ok_or_else(|| {
            tessel_err!(
                QueryError: "subarray of {} byte coordinates is too large",
                schema.coords_size()
            )
        })?;

    let mut buffer = Subarray::allocate(len)?;
    match subarray {
        Some(bytes) => buffer.fill_from(bytes)?,
        None => buffer.fill_from(&schema.domain_bytes()?)?,
    }
    Ok(buffer)
}

/// Resolve both halves of a query plan.
pub fn resolve(
    schema: &ArraySchema,
    mode: QueryMode,
    attributes: Option<&[&str]>,
    subarray: Option<&[u8]>,
    config: &Config,
) -> TesselResult<(Vec<AttributeId>, Subarray)> {
    let attribute_ids = resolve_attributes(schema, mode, attributes, config)?;
    let subarray = resolve_subarray(schema, subarray)?;
    Ok((attribute_ids, subarray))
}
