//! Conversion of raw input into canonical, type-validated value trees.
//!
//! Normalization runs before any merge: the merge engine operates purely on
//! canonical tree shape and relies on leaves having been converted once and
//! for all. Field names and structural shape are validated against the type
//! descriptor here; numeric leaves run through the unit algebra.
//!
//! Errors and rounding warnings both carry the dotted/bracketed path from
//! the section root. The path is accumulated on the way out of the
//! recursion: each frame prefixes `.field` or `[index]` to whatever its
//! children reported.

use crate::error::ConfigError;
use crate::types::{PropertyModel, TypeDescriptor};
use crate::units::{evaluate_numeric, RoundingWarning};
use crate::value::{ConfMapping, ConfValue, LiveValue, RawValue, Scalar};
use std::collections::BTreeMap;

/// Normalize a whole section body against a component model.
///
/// Every top-level key must name a declared property. The context string is
/// attached to any rounding warnings, so the top-level caller can report
/// where a defaulted rounding mode came from.
pub fn normalize_section<M: PropertyModel + ?Sized>(
    raw: &RawValue,
    model: &M,
    context: &str,
) -> Result<(ConfMapping, Vec<RoundingWarning>), ConfigError> {
    let entries = match raw {
        RawValue::Mapping(entries) => entries,
        // An empty document decodes as null; treat it as an empty section.
        RawValue::Null => return Ok((ConfMapping::new(), Vec::new())),
        other => {
            return Err(ConfigError::ConversionFailed {
                path: String::new(),
                cause: format!("section body must be a mapping, got a {}", other.kind_name()),
            })
        }
    };

    let mut warnings = Vec::new();
    let mut result = ConfMapping::new();
    for (property, value) in entries {
        let descriptor =
            model
                .find_property(property)
                .ok_or_else(|| ConfigError::UnknownProperty {
                    model: model.model_name().to_string(),
                    property: property.clone(),
                })?;
        let normalized = normalize_child(value, descriptor, context, &mut warnings, property)?;
        result.insert(property.clone(), normalized);
    }
    Ok((result, warnings))
}

/// Normalize a single raw value against its descriptor.
pub fn normalize_value(
    raw: &RawValue,
    descriptor: &TypeDescriptor,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
) -> Result<ConfValue, ConfigError> {
    if let RawValue::PreTyped(live) = raw {
        return normalize_live(live, descriptor, context, warnings);
    }

    match descriptor {
        TypeDescriptor::Numeric { integer } => match raw {
            RawValue::Scalar(scalar) => {
                let value = evaluate_numeric(scalar, *integer, context, warnings)?;
                Ok(ConfValue::Leaf(value))
            }
            other => Err(shape_error(descriptor, other)),
        },
        TypeDescriptor::Text => match raw {
            RawValue::Scalar(Scalar::Text(text)) => {
                Ok(ConfValue::Leaf(Scalar::Text(text.clone())))
            }
            other => Err(shape_error(descriptor, other)),
        },
        TypeDescriptor::Compound { fields } => match raw {
            RawValue::Mapping(entries) => {
                normalize_mapping(entries, fields, context, warnings)
            }
            other => Err(shape_error(descriptor, other)),
        },
        TypeDescriptor::Sequence { element, fixed_len } => match raw {
            RawValue::Sequence(elements) => {
                normalize_sequence(elements, element, *fixed_len, context, warnings)
            }
            other => Err(shape_error(descriptor, other)),
        },
    }
}

fn normalize_mapping(
    entries: &BTreeMap<String, RawValue>,
    fields: &BTreeMap<String, TypeDescriptor>,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
) -> Result<ConfValue, ConfigError> {
    let mut result = BTreeMap::new();
    for (key, value) in entries {
        let field = fields.get(key).ok_or_else(|| ConfigError::ConversionFailed {
            path: String::new(),
            cause: format!("'{}' is not a field of this compound", key),
        })?;
        result.insert(
            key.clone(),
            normalize_child(value, field, context, warnings, key)?,
        );
    }
    // Unlisted fields are simply absent: the mapping is a partial value.
    Ok(ConfValue::Mapping(result))
}

fn normalize_sequence(
    elements: &[RawValue],
    element: &TypeDescriptor,
    fixed_len: Option<usize>,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
) -> Result<ConfValue, ConfigError> {
    if let Some(max) = fixed_len {
        if elements.len() > max {
            return Err(ConfigError::ArrayTooLarge {
                path: String::new(),
                got: elements.len(),
                max,
            });
        }
    }

    let mut result = Vec::with_capacity(elements.len());
    for (index, value) in elements.iter().enumerate() {
        if matches!(value, RawValue::Null) {
            result.push(None);
            continue;
        }
        let segment = format!("[{}]", index);
        let mark = warnings.len();
        let normalized =
            normalize_value(value, element, context, warnings).map_err(|e| e.prefix_path(&segment))?;
        prefix_warnings(warnings, mark, &segment);
        result.push(Some(normalized));
    }
    Ok(ConfValue::Sequence(result))
}

/// Decompose an already-typed live value into a canonical tree.
///
/// Live values are complete, so the result has no holes and lists every
/// field. The shape must still agree with the descriptor.
fn normalize_live(
    live: &LiveValue,
    descriptor: &TypeDescriptor,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
) -> Result<ConfValue, ConfigError> {
    match (live, descriptor) {
        (LiveValue::Scalar(scalar), TypeDescriptor::Numeric { integer }) => Ok(ConfValue::Leaf(
            evaluate_numeric(scalar, *integer, context, warnings)?,
        )),
        (LiveValue::Scalar(Scalar::Text(text)), TypeDescriptor::Text) => {
            Ok(ConfValue::Leaf(Scalar::Text(text.clone())))
        }
        (LiveValue::Struct(fields), TypeDescriptor::Compound { .. }) => {
            let mut result = BTreeMap::new();
            for (key, value) in fields {
                let field =
                    descriptor
                        .field(key)
                        .ok_or_else(|| ConfigError::ConversionFailed {
                            path: String::new(),
                            cause: format!("'{}' is not a field of this compound", key),
                        })?;
                let mark = warnings.len();
                let segment = format!(".{}", key);
                let normalized = normalize_live(value, field, context, warnings)
                    .map_err(|e| e.prefix_path(&segment))?;
                prefix_warnings(warnings, mark, &segment);
                result.insert(key.clone(), normalized);
            }
            Ok(ConfValue::Mapping(result))
        }
        (LiveValue::Sequence(elements), TypeDescriptor::Sequence { element, fixed_len }) => {
            if let Some(max) = fixed_len {
                if elements.len() > *max {
                    return Err(ConfigError::ArrayTooLarge {
                        path: String::new(),
                        got: elements.len(),
                        max: *max,
                    });
                }
            }
            let mut result = Vec::with_capacity(elements.len());
            for (index, value) in elements.iter().enumerate() {
                let segment = format!("[{}]", index);
                let mark = warnings.len();
                let normalized = normalize_live(value, element, context, warnings)
                    .map_err(|e| e.prefix_path(&segment))?;
                prefix_warnings(warnings, mark, &segment);
                result.push(Some(normalized));
            }
            Ok(ConfValue::Sequence(result))
        }
        (live, descriptor) => Err(ConfigError::ConversionFailed {
            path: String::new(),
            cause: format!(
                "got a {} for a {} field",
                live.kind_name(),
                descriptor.kind_name()
            ),
        }),
    }
}

/// Recurse into a named child, prefixing `.key` on errors and on any
/// warnings the child produced.
fn normalize_child(
    raw: &RawValue,
    descriptor: &TypeDescriptor,
    context: &str,
    warnings: &mut Vec<RoundingWarning>,
    key: &str,
) -> Result<ConfValue, ConfigError> {
    let segment = format!(".{}", key);
    let mark = warnings.len();
    let normalized =
        normalize_value(raw, descriptor, context, warnings).map_err(|e| e.prefix_path(&segment))?;
    prefix_warnings(warnings, mark, &segment);
    Ok(normalized)
}

fn prefix_warnings(warnings: &mut [RoundingWarning], from: usize, segment: &str) {
    for warning in &mut warnings[from..] {
        warning.path = format!("{}{}", segment, warning.path);
    }
}

fn shape_error(descriptor: &TypeDescriptor, raw: &RawValue) -> ConfigError {
    ConfigError::ConversionFailed {
        path: String::new(),
        cause: format!(
            "got a {} for a {} field",
            raw.kind_name(),
            descriptor.kind_name()
        ),
    }
}
