//! Merge engine over canonical value trees.
//!
//! Two disciplines exist. Override merge lets the right-hand side win on any
//! leaf disagreement; strict merge raises a conflict when two unequal leaves
//! meet at the same address. Equal leaves always pass through silently —
//! equality is full structural equality, bit-for-bit for floats.
//!
//! The engine knows nothing about type descriptors: it operates purely on
//! the canonical tree shape, which is why normalization must run first.

use crate::error::ConfigError;
use crate::value::{ConfMapping, ConfValue};
use std::collections::btree_map::Entry;

/// Merge section `b` into section `a`.
///
/// Keys present on one side only pass through. Keys present on both sides
/// recurse: mapping into mapping, sequence into sequence, and anything else
/// is resolved leaf-wise (override, or conflict on inequality).
pub fn merge_conf(
    a: &ConfMapping,
    b: &ConfMapping,
    override_: bool,
) -> Result<ConfMapping, ConfigError> {
    let mut result = a.clone();
    for (key, value) in b {
        match result.entry(key.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(value.clone());
            }
            Entry::Occupied(mut entry) => {
                let merged = merge_value(entry.get(), value, override_, key)?;
                entry.insert(merged);
            }
        }
    }
    Ok(result)
}

/// Merge two sequences index by index, up to the longer length.
///
/// A hole on either side yields the other side's element; two present
/// elements recurse like mapping values. Indices beyond `a`'s length that
/// exist only in `b` are appended verbatim.
pub fn merge_sequence(
    a: &[Option<ConfValue>],
    b: &[Option<ConfValue>],
    override_: bool,
) -> Result<Vec<Option<ConfValue>>, ConfigError> {
    let mut result = Vec::with_capacity(a.len().max(b.len()));
    for (index, left) in a.iter().enumerate() {
        let right = b.get(index).and_then(Option::as_ref);
        let merged = match (left.as_ref(), right) {
            (None, None) => None,
            (Some(value), None) => Some(value.clone()),
            (None, Some(value)) => Some(value.clone()),
            (Some(left), Some(right)) => {
                Some(merge_value(left, right, override_, &format!("[{}]", index))?)
            }
        };
        result.push(merged);
    }
    if b.len() > a.len() {
        result.extend(b[a.len()..].iter().cloned());
    }
    Ok(result)
}

fn merge_value(
    left: &ConfValue,
    right: &ConfValue,
    override_: bool,
    key: &str,
) -> Result<ConfValue, ConfigError> {
    match (left, right) {
        (ConfValue::Mapping(a), ConfValue::Mapping(b)) => {
            Ok(ConfValue::Mapping(merge_conf(a, b, override_)?))
        }
        (ConfValue::Sequence(a), ConfValue::Sequence(b)) => {
            Ok(ConfValue::Sequence(merge_sequence(a, b, override_)?))
        }
        _ if override_ => Ok(right.clone()),
        _ if left == right => Ok(left.clone()),
        _ => Err(ConfigError::MergeConflict {
            key: key.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }),
    }
}
