//! Shared fixtures for the integration tests

use taskconf::store::{SectionDocument, SectionHeader, TaskConfigurations};
use taskconf::types::{ComponentModel, TypeDescriptor};
use taskconf::value::RawValue;

/// A controller-like model with scalar, compound and sequence properties.
pub fn controller_model() -> ComponentModel {
    ComponentModel::new("motion::Controller")
        .with_property("threshold", TypeDescriptor::integer())
        .with_property("speed", TypeDescriptor::integer())
        .with_property("max_velocity", TypeDescriptor::float())
        .with_property("label", TypeDescriptor::text())
        .with_property(
            "pid",
            TypeDescriptor::compound([
                ("p", TypeDescriptor::float()),
                ("i", TypeDescriptor::float()),
                ("d", TypeDescriptor::float()),
            ]),
        )
        .with_property(
            "window",
            TypeDescriptor::fixed_array(TypeDescriptor::float(), 3),
        )
        .with_property(
            "waypoints",
            TypeDescriptor::container(TypeDescriptor::compound([
                ("x", TypeDescriptor::float()),
                ("y", TypeDescriptor::float()),
            ])),
        )
}

pub fn controller_store() -> TaskConfigurations<ComponentModel> {
    TaskConfigurations::new(controller_model())
}

pub fn yaml(body: &str) -> RawValue {
    serde_yaml::from_str(body).expect("fixture body must be valid YAML")
}

pub fn document(name: Option<&str>, merge: bool, chain: &[&str], body: &str) -> SectionDocument {
    SectionDocument::new(
        SectionHeader {
            name: name.map(String::from),
            merge,
            chain: chain.iter().map(|s| s.to_string()).collect(),
        },
        yaml(body),
    )
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
