//! Named configuration sections for one component model.
//!
//! A [`TaskConfigurations`] owns the canonical sections loaded for a single
//! component model, resolves section chains, memoizes merged combinations
//! and invalidates the memo wholesale whenever a section is added or
//! replaced. It is single-threaded by design: callers needing concurrent
//! access must serialize externally.

use crate::apply::{apply_conf, LiveObject};
use crate::error::ConfigError;
use crate::merge::merge_conf;
use crate::normalize::normalize_section;
use crate::types::PropertyModel;
use crate::units::RoundingWarning;
use crate::value::{ConfMapping, RawValue};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// A parsed section header, as produced by the document-loading layer.
///
/// The header mini-language itself (`--- name:x merge:true chain:a,b`) is
/// parsed elsewhere; this crate only consumes the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionHeader {
    /// Section name. May only be omitted on the first section of a
    /// document, where it defaults to `default`.
    pub name: Option<String>,
    /// Merge with previously stored content under the same name instead of
    /// replacing it.
    pub merge: bool,
    /// Sections to resolve and fold under this one before its own content
    /// is applied.
    pub chain: Vec<String>,
}

/// A parsed section header paired with its structured-data body.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDocument {
    pub header: SectionHeader,
    pub body: RawValue,
}

impl SectionDocument {
    pub fn new(header: SectionHeader, body: RawValue) -> Self {
        Self { header, body }
    }
}

/// Outcome of adding a single section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddReport {
    /// Whether the stored content actually changed.
    pub changed: bool,
    /// Rounding warnings produced while normalizing the input.
    pub warnings: Vec<RoundingWarning>,
}

/// Outcome of loading a multi-section document.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Names of the sections whose stored content changed, in document
    /// order.
    pub changed_sections: Vec<String>,
    /// Rounding warnings from all sections, in document order.
    pub warnings: Vec<RoundingWarning>,
}

/// The set of named configuration sections for one component model.
pub struct TaskConfigurations<M: PropertyModel> {
    model: M,
    sections: BTreeMap<String, ConfMapping>,
    /// Memoized results of [`TaskConfigurations::conf`], keyed by the exact
    /// requested names and override flag. Cleared in full on any mutation;
    /// no partial invalidation is attempted.
    merged_conf: HashMap<(Vec<String>, bool), ConfMapping>,
}

impl<M: PropertyModel> TaskConfigurations<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            sections: BTreeMap::new(),
            merged_conf: HashMap::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Add or update a section from raw input.
    ///
    /// The body is normalized against the model first. If a section with
    /// this name already exists, `merge` selects between folding the new
    /// content over it (override discipline) and replacing it wholesale.
    pub fn add(&mut self, name: &str, conf: &RawValue, merge: bool) -> Result<AddReport, ConfigError> {
        let context = format!(
            "while loading section '{}' of {}",
            name,
            self.model.model_name()
        );
        let (normalized, warnings) = normalize_section(conf, &self.model, &context)?;
        let changed = self.add_canonical(name, normalized, merge)?;
        Ok(AddReport { changed, warnings })
    }

    /// Add or update a section whose content is already canonical.
    ///
    /// Returns whether the stored content changed. Every update replaces
    /// the whole section tree; sections are never partially mutated.
    pub fn add_canonical(
        &mut self,
        name: &str,
        conf: ConfMapping,
        merge: bool,
    ) -> Result<bool, ConfigError> {
        let stored = match self.sections.get(name) {
            Some(existing) if merge => merge_conf(existing, &conf, true)?,
            _ => conf,
        };
        let changed = match self.sections.get(name) {
            None => true,
            Some(old) => *old != stored,
        };
        self.sections.insert(name.to_string(), stored);
        // Conservative invalidation: any mutation clears the whole memo.
        self.merged_conf.clear();
        debug!(
            model = self.model.model_name(),
            section = name,
            changed,
            "stored configuration section"
        );
        Ok(changed)
    }

    /// Load an ordered list of parsed section documents.
    ///
    /// The first document's name defaults to `default`; later documents
    /// must be named. A declared chain is resolved *before* the section's
    /// own content is folded in, so explicit content always wins over the
    /// chain.
    pub fn load_sections(&mut self, documents: &[SectionDocument]) -> Result<LoadReport, ConfigError> {
        let mut report = LoadReport::default();
        for (index, document) in documents.iter().enumerate() {
            let name = match &document.header.name {
                Some(name) => name.clone(),
                None if index == 0 => "default".to_string(),
                None => return Err(ConfigError::UnnamedSection { index }),
            };

            let context = format!(
                "while loading section '{}' of {}",
                name,
                self.model.model_name()
            );
            let (normalized, mut warnings) =
                normalize_section(&document.body, &self.model, &context)?;
            let chain = self.resolve_chain(&document.header.chain)?;
            let effective = merge_conf(&chain, &normalized, true)?;

            let changed = self.add_canonical(&name, effective, document.header.merge)?;
            if changed {
                report.changed_sections.push(name);
            }
            report.warnings.append(&mut warnings);
        }
        if !report.changed_sections.is_empty() {
            info!(
                model = self.model.model_name(),
                sections = ?report.changed_sections,
                "configuration sections changed"
            );
        }
        Ok(report)
    }

    /// Resolve a section chain to its merged base value.
    ///
    /// Chains always merge permissively (override discipline), regardless
    /// of the declaring section's own merge flag. An empty chain yields an
    /// empty mapping.
    pub fn resolve_chain(&mut self, chain: &[String]) -> Result<ConfMapping, ConfigError> {
        self.conf(chain, true)
    }

    /// The configuration combining the named sections, folded left to
    /// right.
    ///
    /// Under `override_ = false` two sections setting the same leaf to
    /// different values is a merge conflict; under `override_ = true` the
    /// later section wins. Multi-name results are memoized by the exact
    /// `(names, override_)` pair until the next mutation.
    pub fn conf(&mut self, names: &[String], override_: bool) -> Result<ConfMapping, ConfigError> {
        if names.is_empty() {
            return Ok(ConfMapping::new());
        }
        if names.len() == 1 {
            return self
                .sections
                .get(&names[0])
                .cloned()
                .ok_or_else(|| ConfigError::UnknownSection(names[0].clone()));
        }

        let key = (names.to_vec(), override_);
        if let Some(cached) = self.merged_conf.get(&key) {
            return Ok(cached.clone());
        }

        let last = &names[names.len() - 1];
        let section = self
            .sections
            .get(last)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownSection(last.clone()))?;
        let base = self.conf(&names[..names.len() - 1], override_)?;
        let merged = merge_conf(&base, &section, override_).map_err(|e| match e {
            conflict @ ConfigError::MergeConflict { .. } => ConfigError::SectionMergeConflict {
                sections: names.to_vec(),
                source: Box::new(conflict),
            },
            other => other,
        })?;

        self.merged_conf.insert(key, merged.clone());
        Ok(merged)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// The stored canonical value of one section.
    pub fn section(&self, name: &str) -> Option<&ConfMapping> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Iterate over `(name, resolved configuration)` for every stored
    /// section. Finite and restartable; a single-name resolution is the
    /// stored value itself.
    pub fn each_resolved_conf(&self) -> impl Iterator<Item = (&str, &ConfMapping)> {
        self.sections.iter().map(|(name, conf)| (name.as_str(), conf))
    }

    /// Read a live object's full property set and store it as a section.
    pub fn extract<T: LiveObject + ?Sized>(
        &mut self,
        name: &str,
        task: &T,
        merge: bool,
    ) -> Result<AddReport, ConfigError> {
        let mut raw = BTreeMap::new();
        for property in task.property_names() {
            let value = task.read_property(&property)?;
            raw.insert(property, RawValue::PreTyped(value));
        }
        self.add(name, &RawValue::Mapping(raw), merge)
    }

    /// Resolve the named sections and apply the result onto a live object.
    pub fn apply<T: LiveObject + ?Sized>(
        &mut self,
        task: &mut T,
        names: &[String],
        override_: bool,
    ) -> Result<(), ConfigError> {
        let conf = self.conf(names, override_)?;
        apply_conf(&conf, task, &self.model)
    }
}
