//! Thin coordinator mapping component-model names to their section stores.
//!
//! The registry holds one [`TaskConfigurations`] per model and adds the
//! request-defaulting rules: an empty request resolves to the only stored
//! section when exactly one exists, and to `default` otherwise. Requests for
//! models with no registered configuration are skipped gracefully when they
//! only ask for the default.

use crate::apply::LiveObject;
use crate::error::ConfigError;
use crate::store::{LoadReport, SectionDocument, TaskConfigurations};
use crate::types::PropertyModel;
use crate::value::ConfMapping;
use std::collections::BTreeMap;
use tracing::info;

/// A set of section stores, one per component model.
#[derive(Default)]
pub struct ConfigurationManager<M: PropertyModel> {
    stores: BTreeMap<String, TaskConfigurations<M>>,
}

impl<M: PropertyModel> ConfigurationManager<M> {
    pub fn new() -> Self {
        Self {
            stores: BTreeMap::new(),
        }
    }

    /// Register a model, creating its (empty) section store. Returns the
    /// store so sections can be loaded immediately.
    pub fn add_model(&mut self, model: M) -> &mut TaskConfigurations<M> {
        let name = model.model_name().to_string();
        self.stores
            .entry(name)
            .or_insert_with(|| TaskConfigurations::new(model))
    }

    pub fn store(&self, model_name: &str) -> Option<&TaskConfigurations<M>> {
        self.stores.get(model_name)
    }

    pub fn store_mut(&mut self, model_name: &str) -> Option<&mut TaskConfigurations<M>> {
        self.stores.get_mut(model_name)
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.stores.keys().map(String::as_str)
    }

    /// Load parsed section documents into a model's store.
    ///
    /// Returns `None` when the model has no registered store; callers
    /// scanning a directory of documents use this to skip files whose model
    /// is unknown.
    pub fn load_sections(
        &mut self,
        model_name: &str,
        documents: &[SectionDocument],
    ) -> Result<Option<LoadReport>, ConfigError> {
        let Some(store) = self.stores.get_mut(model_name) else {
            info!(
                model = model_name,
                "ignoring configuration document, no registered model"
            );
            return Ok(None);
        };
        info!(model = model_name, "loading configuration sections");
        let report = store.load_sections(documents)?;
        info!(
            model = model_name,
            available = ?store.section_names().collect::<Vec<_>>(),
            "available configurations"
        );
        Ok(Some(report))
    }

    /// Resolve a configuration for a model by section names.
    ///
    /// An unknown model yields an empty mapping when only the default is
    /// requested, and [`ConfigError::UnknownModel`] otherwise.
    pub fn resolve(
        &mut self,
        model_name: &str,
        names: &[String],
        override_: bool,
    ) -> Result<ConfMapping, ConfigError> {
        let Some(store) = self.stores.get_mut(model_name) else {
            if is_default_request(names) {
                return Ok(ConfMapping::new());
            }
            return Err(ConfigError::UnknownModel(model_name.to_string()));
        };
        let names = requested_names(store, names);
        store.conf(&names, override_)
    }

    /// Resolve and apply a configuration onto a live object.
    ///
    /// Returns whether anything was applied: a default request against an
    /// unknown model is logged and skipped.
    pub fn apply<T: LiveObject + ?Sized>(
        &mut self,
        model_name: &str,
        task: &mut T,
        names: &[String],
        override_: bool,
    ) -> Result<bool, ConfigError> {
        let Some(store) = self.stores.get_mut(model_name) else {
            if is_default_request(names) {
                info!(
                    model = model_name,
                    "required default configuration, but no configurations are registered"
                );
                return Ok(false);
            }
            return Err(ConfigError::UnknownModel(model_name.to_string()));
        };
        let names = requested_names(store, names);
        info!(model = model_name, sections = ?names, "applying configuration");
        store.apply(task, &names, override_)?;
        Ok(true)
    }
}

fn is_default_request(names: &[String]) -> bool {
    names.is_empty() || (names.len() == 1 && names[0] == "default")
}

/// The original request-defaulting rule: with no names given, use the
/// single stored section when there is exactly one, `default` otherwise.
fn requested_names<M: PropertyModel>(
    store: &TaskConfigurations<M>,
    names: &[String],
) -> Vec<String> {
    if !names.is_empty() {
        return names.to_vec();
    }
    if store.section_count() == 1 {
        store.section_names().map(String::from).collect()
    } else {
        vec!["default".to_string()]
    }
}
