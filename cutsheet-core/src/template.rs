//! Saved cut sheets that can be reapplied to later animals.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::AllocationMap;
use crate::catalog::{CatalogError, SchemaCatalog, SpeciesCatalog};
use crate::normalize::NormalizeOutcome;
use crate::selection::SelectionSet;
use crate::sheet::{CutSheet, SheetError};
use crate::species::Species;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("template name must not be empty")]
    EmptyName,
    #[error("no {0} catalog is loaded")]
    MissingCatalog(Species),
    #[error("template is for {template} but the catalog is for {catalog}")]
    WrongCatalog { template: Species, catalog: Species },
    #[error(transparent)]
    Sheet(#[from] SheetError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A named bundle of selections, parameters and splits, stamped with the
/// fingerprint of the catalog it was captured against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSheetTemplate {
    pub name: String,
    pub species: Species,
    #[serde(default)]
    pub selections: SelectionSet,
    #[serde(default)]
    pub allocations: AllocationMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_fingerprint: Option<u64>,
}

/// A template applied to the current catalog.
#[derive(Debug, Clone)]
pub struct RestoredSheet {
    pub sheet: CutSheet,
    /// The catalog differs from the one the template was captured against.
    pub catalog_changed: bool,
    pub outcome: NormalizeOutcome,
}

impl CutSheetTemplate {
    /// Snapshot a sheet.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, a catalog for another species, or a catalog
    /// that cannot be fingerprinted.
    pub fn capture(
        name: impl Into<String>,
        sheet: &CutSheet,
        catalog: &SpeciesCatalog,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if catalog.species() != sheet.species() {
            return Err(TemplateError::WrongCatalog {
                template: sheet.species(),
                catalog: catalog.species(),
            });
        }
        Ok(Self {
            name,
            species: sheet.species(),
            selections: sheet.selections().clone(),
            allocations: sheet.allocations().clone(),
            catalog_fingerprint: Some(catalog.fingerprint()?),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a template.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, TemplateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore against the species' catalog in `schema`.
    ///
    /// # Errors
    ///
    /// Fails when the schema has no catalog for the template's species.
    pub fn restore(&self, schema: &SchemaCatalog) -> Result<RestoredSheet, TemplateError> {
        let catalog = schema
            .species(self.species)
            .ok_or(TemplateError::MissingCatalog(self.species))?;
        self.restore_into(catalog)
    }

    /// Restore against a specific catalog, such as a seller view. Selections
    /// are normalized and splits resynced, so cuts the catalog no longer
    /// offers are dropped.
    ///
    /// # Errors
    ///
    /// Fails when the catalog belongs to another species or cannot be
    /// fingerprinted.
    pub fn restore_into(&self, catalog: &SpeciesCatalog) -> Result<RestoredSheet, TemplateError> {
        if catalog.species() != self.species {
            return Err(TemplateError::WrongCatalog {
                template: self.species,
                catalog: catalog.species(),
            });
        }
        let current = catalog.fingerprint()?;
        let catalog_changed = self
            .catalog_fingerprint
            .is_none_or(|stamp| stamp != current);
        if catalog_changed {
            log::debug!(
                "template '{}' was captured against a different {} catalog",
                self.name,
                self.species
            );
        }
        let mut sheet = CutSheet::from_parts(
            self.species,
            self.selections.clone(),
            self.allocations.clone(),
        );
        let outcome = sheet.normalize(catalog)?;
        Ok(RestoredSheet {
            sheet,
            catalog_changed,
            outcome,
        })
    }
}
