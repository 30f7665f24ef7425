//! Application of canonical trees onto live typed objects.
//!
//! Application is partial: only the fields and indices present in the
//! canonical value touch the live object. Leaves replace the destination
//! wholesale; holes leave the existing element alone; dynamic containers
//! grow with zero-initialized elements as needed.

use crate::error::ConfigError;
use crate::types::{PropertyModel, TypeDescriptor};
use crate::value::{ConfMapping, ConfValue, LiveValue, Scalar};
use std::collections::BTreeMap;
use tracing::debug;

/// A live object exposing named, typed, readable and writable property
/// slots.
///
/// The runtime that owns the actual component implements this; the crate
/// ships [`PropertySet`] as an in-process implementation for tests and
/// simple consumers.
pub trait LiveObject {
    /// The declared property names, in a stable order.
    fn property_names(&self) -> Vec<String>;

    /// Read the current value of a property slot.
    fn read_property(&self, name: &str) -> Result<LiveValue, ConfigError>;

    /// Overwrite a property slot.
    fn write_property(&mut self, name: &str, value: LiveValue) -> Result<(), ConfigError>;
}

/// Apply a resolved configuration onto a live object.
///
/// For every property in the mapping the current live value is read,
/// updated, and written back. Properties the mapping does not list are not
/// touched.
pub fn apply_conf<M, T>(conf: &ConfMapping, task: &mut T, model: &M) -> Result<(), ConfigError>
where
    M: PropertyModel + ?Sized,
    T: LiveObject + ?Sized,
{
    for (property, value) in conf {
        let descriptor =
            model
                .find_property(property)
                .ok_or_else(|| ConfigError::UnknownProperty {
                    model: model.model_name().to_string(),
                    property: property.clone(),
                })?;
        let current = task.read_property(property)?;
        let updated = apply_value(current, value, descriptor)
            .map_err(|e| e.prefix_path(&format!(".{}", property)))?;
        task.write_property(property, updated)?;
        debug!(property, "applied configuration value");
    }
    Ok(())
}

/// Apply one canonical value onto one live value, returning the updated
/// value.
pub fn apply_value(
    live: LiveValue,
    conf: &ConfValue,
    descriptor: &TypeDescriptor,
) -> Result<LiveValue, ConfigError> {
    match conf {
        ConfValue::Leaf(scalar) => Ok(LiveValue::Scalar(coerce_scalar(scalar, descriptor)?)),
        ConfValue::Mapping(fields) => {
            let LiveValue::Struct(mut live_fields) = live else {
                return Err(ConfigError::ShapeMismatch {
                    path: String::new(),
                    expected: "struct",
                    found: live.kind_name(),
                });
            };
            for (key, value) in fields {
                let field = descriptor
                    .field(key)
                    .ok_or_else(|| ConfigError::ConversionFailed {
                        path: String::new(),
                        cause: format!("'{}' is not a field of this compound", key),
                    })?;
                let current = live_fields
                    .remove(key)
                    .unwrap_or_else(|| field.zero_value());
                let updated = apply_value(current, value, field)
                    .map_err(|e| e.prefix_path(&format!(".{}", key)))?;
                live_fields.insert(key.clone(), updated);
            }
            Ok(LiveValue::Struct(live_fields))
        }
        ConfValue::Sequence(elements) => {
            let LiveValue::Sequence(mut live_elements) = live else {
                return Err(ConfigError::ShapeMismatch {
                    path: String::new(),
                    expected: "sequence",
                    found: live.kind_name(),
                });
            };
            let element = descriptor
                .element()
                .ok_or_else(|| ConfigError::ShapeMismatch {
                    path: String::new(),
                    expected: descriptor.kind_name(),
                    found: "sequence",
                })?;

            if let Some(max) = descriptor.fixed_len() {
                if elements.len() > max {
                    return Err(ConfigError::ArrayTooLarge {
                        path: String::new(),
                        got: elements.len(),
                        max,
                    });
                }
            } else {
                while live_elements.len() < elements.len() {
                    live_elements.push(element.zero_value());
                }
            }

            for (index, value) in elements.iter().enumerate() {
                let Some(value) = value else {
                    // hole: leave the existing element untouched
                    continue;
                };
                let current = live_elements[index].clone();
                live_elements[index] = apply_value(current, value, element)
                    .map_err(|e| e.prefix_path(&format!("[{}]", index)))?;
            }
            Ok(LiveValue::Sequence(live_elements))
        }
    }
}

/// Materialize a resolved configuration as fully typed values, one per
/// property, by applying each entry onto a zero-initialized value.
pub fn conf_as_value<M>(
    conf: &ConfMapping,
    model: &M,
) -> Result<BTreeMap<String, LiveValue>, ConfigError>
where
    M: PropertyModel + ?Sized,
{
    let mut result = BTreeMap::new();
    for (property, value) in conf {
        let descriptor =
            model
                .find_property(property)
                .ok_or_else(|| ConfigError::UnknownProperty {
                    model: model.model_name().to_string(),
                    property: property.clone(),
                })?;
        let materialized = apply_value(descriptor.zero_value(), value, descriptor)
            .map_err(|e| e.prefix_path(&format!(".{}", property)))?;
        result.insert(property.clone(), materialized);
    }
    Ok(result)
}

fn coerce_scalar(scalar: &Scalar, descriptor: &TypeDescriptor) -> Result<Scalar, ConfigError> {
    match (descriptor, scalar) {
        (TypeDescriptor::Numeric { integer: true }, Scalar::Int(v)) => Ok(Scalar::Int(*v)),
        (TypeDescriptor::Numeric { integer: true }, Scalar::Float(v)) => Ok(Scalar::Int(*v as i64)),
        (TypeDescriptor::Numeric { integer: false }, Scalar::Int(v)) => {
            Ok(Scalar::Float(*v as f64))
        }
        (TypeDescriptor::Numeric { integer: false }, Scalar::Float(v)) => Ok(Scalar::Float(*v)),
        (TypeDescriptor::Text, Scalar::Text(v)) => Ok(Scalar::Text(v.clone())),
        (descriptor, scalar) => Err(ConfigError::ConversionFailed {
            path: String::new(),
            cause: format!(
                "cannot write {} into a {} field",
                scalar,
                descriptor.kind_name()
            ),
        }),
    }
}

/// A map-backed [`LiveObject`]: one typed slot per declared property,
/// initialized to the property's zero value.
#[derive(Debug, Clone)]
pub struct PropertySet {
    name: String,
    values: BTreeMap<String, LiveValue>,
}

impl PropertySet {
    /// Build a property set from a model, with every slot zero-initialized.
    pub fn from_model<M: PropertyModel + ?Sized>(model: &M, properties: &[&str]) -> Self {
        let values = properties
            .iter()
            .filter_map(|name| {
                model
                    .find_property(name)
                    .map(|descriptor| (name.to_string(), descriptor.zero_value()))
            })
            .collect();
        Self {
            name: model.model_name().to_string(),
            values,
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: LiveValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&LiveValue> {
        self.values.get(name)
    }
}

impl LiveObject for PropertySet {
    fn property_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    fn read_property(&self, name: &str) -> Result<LiveValue, ConfigError> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownProperty {
                model: self.name.clone(),
                property: name.to_string(),
            })
    }

    fn write_property(&mut self, name: &str, value: LiveValue) -> Result<(), ConfigError> {
        if !self.values.contains_key(name) {
            return Err(ConfigError::UnknownProperty {
                model: self.name.clone(),
                property: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }
}
