//! Canonical and raw configuration value trees.
//!
//! Configuration sections are stored as a combination of mappings (for
//! compounds), sequences (for arrays and containers) and fully typed scalar
//! leaves. Mappings and sequences are *partial* values: when a section is
//! applied, only the fields and indices that are present touch the live
//! object. Leaves are final and replace whatever they are applied to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A fully typed scalar leaf.
///
/// Equality is structural; float comparison is IEEE `f64` equality, which is
/// what the strict merge discipline relies on. No tolerance is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

/// A canonical, type-validated configuration value.
///
/// Produced by the normalizer, stored by the section store, combined by the
/// merge engine and consumed by the applier. A `None` entry in a sequence is
/// a *hole*: it leaves the corresponding live element untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfValue {
    /// A final scalar; replaces the destination wholesale.
    Leaf(Scalar),
    /// A partial compound; only the listed fields are authoritative.
    Mapping(BTreeMap<String, ConfValue>),
    /// A partial sequence with same-index alignment.
    Sequence(Vec<Option<ConfValue>>),
}

/// A top-level section value: property name to canonical value.
pub type ConfMapping = BTreeMap<String, ConfValue>;

impl ConfValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfValue::Leaf(_) => "scalar",
            ConfValue::Mapping(_) => "mapping",
            ConfValue::Sequence(_) => "sequence",
        }
    }

    /// Convert back into the raw representation, e.g. for marshalling a
    /// section to YAML. Holes become explicit nulls.
    pub fn to_raw(&self) -> RawValue {
        match self {
            ConfValue::Leaf(scalar) => RawValue::Scalar(scalar.clone()),
            ConfValue::Mapping(fields) => RawValue::Mapping(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_raw()))
                    .collect(),
            ),
            ConfValue::Sequence(elements) => RawValue::Sequence(
                elements
                    .iter()
                    .map(|e| e.as_ref().map(ConfValue::to_raw).unwrap_or(RawValue::Null))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for ConfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfValue::Leaf(scalar) => write!(f, "{}", scalar),
            other => match serde_json::to_string(&other.to_raw()) {
                Ok(json) => write!(f, "{}", json),
                Err(_) => write!(f, "{:?}", other),
            },
        }
    }
}

/// Convert a whole section back into its raw mapping representation.
pub fn conf_mapping_to_raw(conf: &ConfMapping) -> BTreeMap<String, RawValue> {
    conf.iter().map(|(k, v)| (k.clone(), v.to_raw())).collect()
}

/// A loosely typed input value, as decoded from a structured-data document
/// (YAML, JSON) or read back from a live object.
///
/// The variants are matched explicitly by the normalizer; there is no runtime
/// type inspection beyond this tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Explicit null. Only meaningful as a sequence element, where it
    /// produces a hole; anywhere else it is a conversion failure.
    Null,
    Scalar(Scalar),
    Sequence(Vec<RawValue>),
    Mapping(BTreeMap<String, RawValue>),
    /// An already-typed value read from a live object, e.g. by
    /// [`crate::store::TaskConfigurations::extract`].
    #[serde(skip)]
    PreTyped(LiveValue),
}

impl RawValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Scalar(_) => "scalar",
            RawValue::Sequence(_) => "sequence",
            RawValue::Mapping(_) => "mapping",
            RawValue::PreTyped(_) => "typed value",
        }
    }
}

/// A fully materialized property value as exposed by a live object.
///
/// Unlike [`ConfValue`], a `LiveValue` has no holes: every field and element
/// is present. It can be read, structurally walked, and overwritten.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveValue {
    Scalar(Scalar),
    Struct(BTreeMap<String, LiveValue>),
    Sequence(Vec<LiveValue>),
}

impl LiveValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            LiveValue::Scalar(_) => "scalar",
            LiveValue::Struct(_) => "struct",
            LiveValue::Sequence(_) => "sequence",
        }
    }
}
