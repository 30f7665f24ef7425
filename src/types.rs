//! Structural type descriptors for component properties.
//!
//! Descriptors are supplied by an external type system and consumed here to
//! validate and convert raw configuration input. The crate never infers a
//! descriptor from data.

use crate::value::{LiveValue, Scalar};
use std::collections::BTreeMap;

/// Structural description of a property type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A numeric kind; `integer` distinguishes integer from floating point.
    Numeric { integer: bool },
    /// A text kind.
    Text,
    /// A compound with named, typed fields.
    Compound {
        fields: BTreeMap<String, TypeDescriptor>,
    },
    /// An array or container of identically typed elements. A declared
    /// `fixed_len` makes it a fixed-size array; `None` means the sequence is
    /// dynamically resizable.
    Sequence {
        element: Box<TypeDescriptor>,
        fixed_len: Option<usize>,
    },
}

impl TypeDescriptor {
    pub fn integer() -> Self {
        TypeDescriptor::Numeric { integer: true }
    }

    pub fn float() -> Self {
        TypeDescriptor::Numeric { integer: false }
    }

    pub fn text() -> Self {
        TypeDescriptor::Text
    }

    pub fn compound<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, TypeDescriptor)>,
    {
        TypeDescriptor::Compound {
            fields: fields
                .into_iter()
                .map(|(name, descriptor)| (name.to_string(), descriptor))
                .collect(),
        }
    }

    pub fn fixed_array(element: TypeDescriptor, len: usize) -> Self {
        TypeDescriptor::Sequence {
            element: Box::new(element),
            fixed_len: Some(len),
        }
    }

    pub fn container(element: TypeDescriptor) -> Self {
        TypeDescriptor::Sequence {
            element: Box::new(element),
            fixed_len: None,
        }
    }

    /// The descriptor of a compound's named field.
    pub fn field(&self, name: &str) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Compound { fields } => fields.get(name),
            _ => None,
        }
    }

    /// The element descriptor of a sequence.
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Sequence { element, .. } => Some(element),
            _ => None,
        }
    }

    /// The declared fixed length, if this is a fixed-size sequence.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Sequence { fixed_len, .. } => *fixed_len,
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeDescriptor::Numeric { .. })
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, TypeDescriptor::Numeric { integer: true })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::Numeric { integer: true } => "integer",
            TypeDescriptor::Numeric { integer: false } => "float",
            TypeDescriptor::Text => "text",
            TypeDescriptor::Compound { .. } => "compound",
            TypeDescriptor::Sequence { fixed_len: Some(_), .. } => "array",
            TypeDescriptor::Sequence { fixed_len: None, .. } => "container",
        }
    }

    /// A zero-initialized live value of this type.
    ///
    /// Used by the applier to grow dynamic containers and to materialize a
    /// resolved configuration from scratch. Fixed-size arrays are filled to
    /// their declared length; containers start empty.
    pub fn zero_value(&self) -> LiveValue {
        match self {
            TypeDescriptor::Numeric { integer: true } => LiveValue::Scalar(Scalar::Int(0)),
            TypeDescriptor::Numeric { integer: false } => LiveValue::Scalar(Scalar::Float(0.0)),
            TypeDescriptor::Text => LiveValue::Scalar(Scalar::Text(String::new())),
            TypeDescriptor::Compound { fields } => LiveValue::Struct(
                fields
                    .iter()
                    .map(|(name, descriptor)| (name.clone(), descriptor.zero_value()))
                    .collect(),
            ),
            TypeDescriptor::Sequence { element, fixed_len } => LiveValue::Sequence(
                (0..fixed_len.unwrap_or(0))
                    .map(|_| element.zero_value())
                    .collect(),
            ),
        }
    }
}

/// Access to the declared properties of one component model.
pub trait PropertyModel {
    /// The model name, used in diagnostics.
    fn model_name(&self) -> &str;

    /// Look up the descriptor of a declared property.
    fn find_property(&self, name: &str) -> Option<&TypeDescriptor>;
}

/// A map-backed [`PropertyModel`] for consumers that declare their property
/// set directly instead of bridging an external type system.
#[derive(Debug, Clone, Default)]
pub struct ComponentModel {
    name: String,
    properties: BTreeMap<String, TypeDescriptor>,
}

impl ComponentModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }

    pub fn add_property(&mut self, name: impl Into<String>, descriptor: TypeDescriptor) {
        self.properties.insert(name.into(), descriptor);
    }
}

impl PropertyModel for ComponentModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn find_property(&self, name: &str) -> Option<&TypeDescriptor> {
        self.properties.get(name)
    }
}
