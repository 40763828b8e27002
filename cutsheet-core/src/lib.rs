//! Cut Sheet Engine
//!
//! Constraint engine for livestock cut sheets: per-species catalogs of body
//! parts and cuts, validation of a producer's selections against anatomical
//! rules, availability previews, automatic repair, seller catalog overlays and
//! percentage splits for shared primals. Pure logic with no I/O beyond the
//! catalog data compiled into the crate.

pub mod allocation;
pub mod availability;
pub mod catalog;
pub mod normalize;
pub mod params;
pub mod selection;
pub mod seller;
pub mod sheet;
pub mod species;
pub mod template;
pub mod validation;

// Re-export commonly used types
pub use allocation::{AllocationEntry, AllocationError, AllocationMap, split_members};
pub use availability::{CutAvailability, can_add_cut, cut_availability, required_cuts, would_disable};
pub use catalog::{
    BodyPart, BodyPartDef, CatalogError, CutChoice, CutId, CutStyle, GroupingMode, SchemaCatalog,
    SpeciesCatalog, SpeciesCatalogDef, integrity_problems,
};
pub use normalize::{NormalizeOutcome, normalize, normalize_catalog};
pub use params::{OptionSet, ParamOverrides, ParameterSchema, ResolvedParams, ToggleParam};
pub use selection::{Selection, SelectionSet};
pub use seller::{
    CustomCutDef, FilteredCatalog, NOT_OFFERED_REASON, SellerCatalogConfig, SellerConfigError,
    WeightRequirements, apply_config,
};
pub use sheet::{CutSheet, SheetError, SheetStatus};
pub use species::{Species, UnknownSpecies};
pub use template::{CutSheetTemplate, RestoredSheet, TemplateError};
pub use validation::{
    DisabledOption, ErrorKind, ValidationError, ValidationResult, ValidationWarning, WarningKind,
    validate, validate_catalog,
};

/// Trait for abstracting template persistence.
/// Hosts provide the storage; the engine re-normalizes whatever comes back.
pub trait TemplateStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a template under its name, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be stored.
    fn save_template(&self, template: &CutSheetTemplate) -> Result<(), Self::Error>;

    /// Load a template by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load_template(&self, name: &str) -> Result<Option<CutSheetTemplate>, Self::Error>;
}

/// Species-keyed entry point over a loaded schema.
#[derive(Debug, Clone, Copy)]
pub struct CutSheetEngine<'a> {
    schema: &'a SchemaCatalog,
}

impl Default for CutSheetEngine<'static> {
    fn default() -> Self {
        Self::new(SchemaCatalog::builtin())
    }
}

impl<'a> CutSheetEngine<'a> {
    pub const fn new(schema: &'a SchemaCatalog) -> Self {
        Self { schema }
    }

    #[must_use]
    pub const fn schema(&self) -> &'a SchemaCatalog {
        self.schema
    }

    #[must_use]
    pub fn catalog(&self, species: Species) -> Option<&'a SpeciesCatalog> {
        self.schema.species(species)
    }

    /// Validate selections; a species without a catalog fails closed.
    #[must_use]
    pub fn validate(&self, species: Species, selections: &SelectionSet) -> ValidationResult {
        validate(self.schema, species, selections)
    }

    /// Availability of every cut, or nothing for a species without a catalog.
    #[must_use]
    pub fn cut_availability(&self, species: Species, selections: &SelectionSet) -> Vec<CutAvailability> {
        self.catalog(species)
            .map_or_else(Vec::new, |catalog| cut_availability(catalog, selections))
    }

    #[must_use]
    pub fn would_disable(&self, species: Species, cut_id: &str) -> Vec<CutId> {
        self.catalog(species)
            .map_or_else(Vec::new, |catalog| would_disable(catalog, cut_id))
    }

    #[must_use]
    pub fn can_add_cut(
        &self,
        species: Species,
        cut_id: &str,
        selections: &SelectionSet,
    ) -> CutAvailability {
        self.catalog(species).map_or_else(
            || CutAvailability {
                cut_id: cut_id.to_string(),
                available: false,
                reason: Some(format!("No {} catalog is available", species.display_name())),
                caused_by: None,
            },
            |catalog| can_add_cut(catalog, cut_id, selections),
        )
    }

    #[must_use]
    pub fn required_cuts(&self, species: Species, cut_id: &str) -> Vec<&'a CutChoice> {
        self.catalog(species)
            .map_or_else(Vec::new, |catalog| required_cuts(catalog, cut_id))
    }

    #[must_use]
    pub fn normalize(&self, species: Species, selections: &SelectionSet) -> NormalizeOutcome {
        normalize(self.schema, species, selections)
    }

    /// Seller view of a species' catalog; `None` when the species has no
    /// catalog or the seller does not process it.
    #[must_use]
    pub fn apply_config(
        &self,
        species: Species,
        config: Option<&SellerCatalogConfig>,
    ) -> Option<FilteredCatalog<'a>> {
        self.catalog(species)
            .and_then(|catalog| apply_config(catalog, config))
    }

    /// Capture a sheet against its species' catalog and hand it to the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or a [`TemplateError`] converted into it
    /// when the name is empty or no catalog is loaded for the sheet.
    pub fn save_sheet<S>(
        &self,
        store: &S,
        name: &str,
        sheet: &CutSheet,
    ) -> Result<CutSheetTemplate, S::Error>
    where
        S: TemplateStore,
        S::Error: From<TemplateError>,
    {
        let catalog = self
            .catalog(sheet.species())
            .ok_or(TemplateError::MissingCatalog(sheet.species()))?;
        let template = CutSheetTemplate::capture(name, sheet, catalog)?;
        store.save_template(&template)?;
        Ok(template)
    }

    /// Load a saved template and restore it against the current catalog.
    ///
    /// # Errors
    ///
    /// Returns the store's error, or a [`TemplateError`] converted into it.
    pub fn restore_saved<S>(&self, store: &S, name: &str) -> Result<Option<RestoredSheet>, S::Error>
    where
        S: TemplateStore,
        S::Error: From<TemplateError>,
    {
        let Some(template) = store.load_template(name)? else {
            return Ok(None);
        };
        Ok(Some(template.restore(self.schema)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error(transparent)]
    struct StoreError(#[from] TemplateError);

    #[derive(Default)]
    struct MemoryStore {
        saved: RefCell<HashMap<String, CutSheetTemplate>>,
    }

    impl TemplateStore for MemoryStore {
        type Error = StoreError;

        fn save_template(&self, template: &CutSheetTemplate) -> Result<(), Self::Error> {
            self.saved
                .borrow_mut()
                .insert(template.name.clone(), template.clone());
            Ok(())
        }

        fn load_template(&self, name: &str) -> Result<Option<CutSheetTemplate>, Self::Error> {
            Ok(self.saved.borrow().get(name).cloned())
        }
    }

    #[test]
    fn engine_answers_per_species() {
        let engine = CutSheetEngine::default();
        let selections = SelectionSet::from_ids(["tbone"]);
        assert!(engine.validate(Species::Beef, &selections).is_valid);
        assert_eq!(
            engine.would_disable(Species::Beef, "tbone"),
            vec!["nystrip", "filet"]
        );
        assert!(!engine.can_add_cut(Species::Beef, "filet", &selections).available);
        assert_eq!(engine.required_cuts(Species::Beef, "filet")[0].id, "nystrip");
        assert_eq!(
            engine.cut_availability(Species::Goat, &SelectionSet::new()).len(),
            engine.catalog(Species::Goat).unwrap().cuts().len()
        );
    }

    #[test]
    fn empty_engine_fails_closed() {
        let schema = SchemaCatalog::default();
        let engine = CutSheetEngine::new(&schema);
        let result = engine.validate(Species::Lamb, &SelectionSet::new());
        assert!(!result.is_valid);
        assert!(result.errors.is_empty());
        assert!(engine.cut_availability(Species::Lamb, &SelectionSet::new()).is_empty());
        assert!(!engine.can_add_cut(Species::Lamb, "rack_of_lamb", &SelectionSet::new()).available);
        assert!(engine.apply_config(Species::Lamb, None).is_none());
    }

    #[test]
    fn saved_sheets_round_trip_through_the_store() {
        let engine = CutSheetEngine::default();
        let store = MemoryStore::default();
        let beef = engine.catalog(Species::Beef).unwrap();
        let mut sheet = CutSheet::new(Species::Beef);
        sheet.select_id(beef, "ribeye").unwrap();
        sheet.select_id(beef, "primerib").unwrap();
        sheet.set_split(beef, "rib", "ribeye", 75).unwrap();

        let saved = engine.save_sheet(&store, "Quarter", &sheet).unwrap();
        assert_eq!(saved.catalog_fingerprint, Some(beef.fingerprint().unwrap()));
        assert!(engine.save_sheet(&store, " ", &sheet).is_err());

        let restored = engine.restore_saved(&store, "Quarter").unwrap().unwrap();
        assert!(!restored.catalog_changed);
        assert_eq!(restored.sheet, sheet);

        let empty = SchemaCatalog::default();
        let err = CutSheetEngine::new(&empty)
            .save_sheet(&store, "Quarter", &sheet)
            .unwrap_err();
        assert!(matches!(err.0, TemplateError::MissingCatalog(Species::Beef)));
    }

    #[test]
    fn saved_templates_come_back_normalized() {
        let engine = CutSheetEngine::default();
        let store = MemoryStore::default();
        let template = CutSheetTemplate {
            name: "Strip and filet".to_string(),
            species: Species::Beef,
            selections: SelectionSet::from_ids(["nystrip", "tbone"]),
            allocations: AllocationMap::new(),
            catalog_fingerprint: None,
        };
        store.save_template(&template).unwrap();
        let restored = engine
            .restore_saved(&store, "Strip and filet")
            .unwrap()
            .unwrap();
        let ids: Vec<_> = restored.sheet.selections().ids().collect();
        assert_eq!(ids, vec!["nystrip", "filet"]);
        assert!(engine.restore_saved(&store, "missing").unwrap().is_none());
    }
}
