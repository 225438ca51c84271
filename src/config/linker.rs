//! Field linker.
//!
//! Runs once after sources are merged. A linked field that resolved empty
//! takes the value of the field it refers to; chains are followed in
//! dependency order so `c -> b -> a` ends with `c == a` whatever the
//! declaration order.

use super::schema::Schema;
use super::sources::Origin;
use crate::error::{Result, SettingsError};
use serde_json::Value;
use std::collections::HashMap;

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub origin: Origin,
}

impl Resolved {
    pub fn new(value: Value, origin: Origin) -> Self {
        Self { value, origin }
    }
}

/// Check that every link target exists and that links never loop.
pub fn validate_links(schema: &Schema) -> Result<()> {
    for (field, target) in schema.links() {
        if schema.get(target).is_none() {
            return Err(SettingsError::UnknownReference {
                field: field.to_string(),
                refer_to: target.to_string(),
            });
        }
    }

    // Each field has at most one outgoing link, so walking forward from every
    // field either ends or revisits a node.
    for spec in schema.fields() {
        let mut path = vec![spec.key()];
        let mut next = spec.refer_to.as_deref();
        while let Some(target) = next {
            let key = target.to_ascii_lowercase();
            if let Some(start) = path.iter().position(|seen| *seen == key) {
                let mut cycle = path.split_off(start);
                cycle.push(key);
                return Err(SettingsError::LinkCycle { path: cycle });
            }
            path.push(key);
            next = schema.get(target).and_then(|s| s.refer_to.as_deref());
        }
    }

    Ok(())
}

/// Resolve every field from supplied values, links and defaults.
///
/// `supplied` holds the merged source values keyed by lowercased field name.
/// A field maps to `None` when nothing produced a value; the caller decides
/// whether that is an error. Links must have passed [`validate_links`].
pub fn link_fields(
    schema: &Schema,
    supplied: &HashMap<String, Resolved>,
) -> HashMap<String, Option<Resolved>> {
    let mut done = HashMap::new();
    for spec in schema.fields() {
        resolve_field(schema, &spec.key(), supplied, &mut done);
    }
    done
}

fn resolve_field(
    schema: &Schema,
    key: &str,
    supplied: &HashMap<String, Resolved>,
    done: &mut HashMap<String, Option<Resolved>>,
) -> Option<Resolved> {
    if let Some(resolved) = done.get(key) {
        return resolved.clone();
    }
    let spec = schema.get(key)?;
    let given = supplied.get(key);

    let result = match (given, spec.refer_to.as_deref()) {
        (Some(r), _) if !r.value.is_null() => Some(r.clone()),
        (given, Some(target)) => {
            let target_key = target.to_ascii_lowercase();
            match resolve_field(schema, &target_key, supplied, done) {
                Some(linked) if !linked.value.is_null() => Some(Resolved::new(
                    linked.value,
                    Origin::Linked(target_key),
                )),
                _ => match given {
                    Some(r) => Some(r.clone()),
                    None => spec
                        .default
                        .clone()
                        .map(|d| Resolved::new(d, Origin::Default)),
                },
            }
        }
        (Some(r), None) => Some(r.clone()),
        (None, None) => spec
            .default
            .clone()
            .map(|d| Resolved::new(d, Origin::Default)),
    };

    done.insert(key.to_string(), result.clone());
    result
}
