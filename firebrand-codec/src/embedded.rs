//! Flattening of embedded value objects into namespaced columns.
//!
//! An embedded value under storage prefix `p` writes each scalar `c` to
//! column `p.c` and each nested value `n` under prefix `p.n`, recursively.

use crate::{CodecError, CodecResult, decode, encode};
use firebrand_model::{EmbeddableDescriptor, Embedded, Registry, nested_column};
use firebrand_types::{ColumnValue, Row};
use std::collections::BTreeMap;

/// Writes the columns of `value` under `prefix` into `out`. Null properties
/// and absent nested values write nothing.
pub fn flatten(
    prefix: &str,
    value: &Embedded,
    descriptor: &EmbeddableDescriptor,
    registry: &Registry,
    out: &mut BTreeMap<String, ColumnValue>,
) -> CodecResult<()> {
    if value.embeddable_type != descriptor.embeddable_type {
        return Err(CodecError::WrongEmbeddable {
            property: prefix.to_string(),
            expected: descriptor.embeddable_type.clone(),
            found: value.embeddable_type.clone(),
        });
    }
    let declared = |property: &str| {
        descriptor.column_for(property).is_some()
            || descriptor.embedded.iter().any(|n| n.property == property)
    };
    if let Some(property) = value
        .values
        .keys()
        .chain(value.nested.keys())
        .find(|p| !declared(p.as_str()))
    {
        return Err(CodecError::UndeclaredProperty {
            embeddable: descriptor.embeddable_type.clone(),
            property: property.clone(),
        });
    }

    for column in &descriptor.columns {
        if let Some(encoded) = encode(value.get(&column.property), column)? {
            out.insert(nested_column(prefix, column.column()), encoded);
        }
    }
    for nested in &descriptor.embedded {
        let Some(inner) = value.nested(&nested.property) else {
            continue;
        };
        let target = embeddable(registry, nested.target())?;
        flatten(
            &nested_column(prefix, nested.column()),
            inner,
            target,
            registry,
            out,
        )?;
    }
    Ok(())
}

/// Rebuilds the embedded value stored under `prefix`.
///
/// The value is present iff at least one column under the prefix exists.
pub fn unflatten(
    prefix: &str,
    row: &Row,
    descriptor: &EmbeddableDescriptor,
    registry: &Registry,
) -> CodecResult<Option<Embedded>> {
    if !row.has_prefix(&format!("{prefix}.")) {
        return Ok(None);
    }
    let mut value = Embedded::new(&descriptor.embeddable_type);
    for column in &descriptor.columns {
        let decoded = decode(row.get(&nested_column(prefix, column.column())), column)?;
        if !decoded.is_null() {
            value.set(&column.property, decoded);
        }
    }
    for nested in &descriptor.embedded {
        let target = embeddable(registry, nested.target())?;
        let inner = unflatten(&nested_column(prefix, nested.column()), row, target, registry)?;
        if inner.is_some() {
            value.set_nested(&nested.property, inner);
        }
    }
    Ok(Some(value))
}

fn embeddable<'r>(registry: &'r Registry, name: &str) -> CodecResult<&'r EmbeddableDescriptor> {
    registry
        .embeddable(name)
        .ok_or_else(|| CodecError::UnknownEmbeddable(name.to_string()))
}
