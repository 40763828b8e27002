//! An editing session over one animal's cut sheet.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::{AllocationError, AllocationMap, split_members};
use crate::catalog::{CutId, SpeciesCatalog};
use crate::normalize::{NormalizeOutcome, normalize_catalog};
use crate::params::ParamOverrides;
use crate::selection::{Selection, SelectionSet};
use crate::species::Species;
use crate::validation::{ValidationResult, validate_catalog};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("sheet is for {sheet} but the catalog is for {catalog}")]
    WrongCatalog { sheet: Species, catalog: Species },
    #[error("'{cut_id}' is not a {species} cut")]
    UnknownCut { species: Species, cut_id: CutId },
    #[error("{name} is not offered: {reason}")]
    NotOffered { name: String, reason: String },
    #[error("'{0}' is already selected")]
    AlreadySelected(CutId),
    #[error("'{0}' is not selected")]
    NotSelected(CutId),
    #[error("{part} already splits its yield between two cuts; remove one before adding {name}")]
    SplitFull { part: String, name: String },
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Everything a caller needs to decide whether the sheet can be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetStatus {
    pub validation: ValidationResult,
    /// Split parts whose shares do not total 100.
    pub incomplete_allocations: Vec<String>,
    pub can_finalize: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutSheet {
    species: Species,
    #[serde(default)]
    selections: SelectionSet,
    #[serde(default)]
    allocations: AllocationMap,
}

impl CutSheet {
    #[must_use]
    pub fn new(species: Species) -> Self {
        Self {
            species,
            selections: SelectionSet::new(),
            allocations: AllocationMap::new(),
        }
    }

    /// Rebuild a sheet from stored parts. Nothing is checked; call
    /// [`CutSheet::normalize`] to reconcile with the catalog.
    #[must_use]
    pub const fn from_parts(
        species: Species,
        selections: SelectionSet,
        allocations: AllocationMap,
    ) -> Self {
        Self {
            species,
            selections,
            allocations,
        }
    }

    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    #[must_use]
    pub const fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    #[must_use]
    pub const fn allocations(&self) -> &AllocationMap {
        &self.allocations
    }

    fn check_catalog(&self, catalog: &SpeciesCatalog) -> Result<(), SheetError> {
        if catalog.species() == self.species {
            Ok(())
        } else {
            Err(SheetError::WrongCatalog {
                sheet: self.species,
                catalog: catalog.species(),
            })
        }
    }

    /// Add a cut.
    ///
    /// # Errors
    ///
    /// Rejects unknown or unoffered cuts, duplicates, and a third member of a
    /// split part.
    pub fn select(&mut self, catalog: &SpeciesCatalog, selection: Selection) -> Result<(), SheetError> {
        self.check_catalog(catalog)?;
        let cut = catalog
            .cut(&selection.cut_id)
            .ok_or_else(|| SheetError::UnknownCut {
                species: self.species,
                cut_id: selection.cut_id.clone(),
            })?;
        if cut.disabled {
            return Err(SheetError::NotOffered {
                name: cut.name.clone(),
                reason: cut
                    .disabled_reason
                    .clone()
                    .unwrap_or_else(|| crate::seller::NOT_OFFERED_REASON.to_string()),
            });
        }
        if self.selections.contains(&cut.id) {
            return Err(SheetError::AlreadySelected(cut.id.clone()));
        }
        if let Some(part) = catalog.split_part(cut) {
            if split_members(catalog, &self.selections, &part.id).len() >= 2 {
                return Err(SheetError::SplitFull {
                    part: part.name.clone(),
                    name: cut.name.clone(),
                });
            }
        }
        let cut_id = cut.id.clone();
        self.selections.add(selection);
        self.allocations.on_select(catalog, &self.selections, &cut_id);
        Ok(())
    }

    /// Add a cut by id with default parameters.
    ///
    /// # Errors
    ///
    /// See [`CutSheet::select`].
    pub fn select_id(&mut self, catalog: &SpeciesCatalog, cut_id: &str) -> Result<(), SheetError> {
        self.select(catalog, Selection::new(cut_id))
    }

    /// Remove a cut and release its share of any split.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::NotSelected`] when the cut is not on the sheet.
    pub fn deselect(&mut self, cut_id: &str) -> Result<Selection, SheetError> {
        let removed = self
            .selections
            .remove(cut_id)
            .ok_or_else(|| SheetError::NotSelected(cut_id.to_string()))?;
        self.allocations.on_deselect(cut_id);
        Ok(removed)
    }

    /// Replace the parameter overrides of a selected cut.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::NotSelected`] when the cut is not on the sheet.
    pub fn set_params(&mut self, cut_id: &str, params: ParamOverrides) -> Result<(), SheetError> {
        let selection = self
            .selections
            .get_mut(cut_id)
            .ok_or_else(|| SheetError::NotSelected(cut_id.to_string()))?;
        selection.params = params;
        Ok(())
    }

    /// Set one member's share of a split part.
    ///
    /// # Errors
    ///
    /// Propagates [`AllocationError`] for parts or cuts that are not split.
    pub fn set_split(
        &mut self,
        catalog: &SpeciesCatalog,
        part_id: &str,
        cut_id: &str,
        percent: u8,
    ) -> Result<(), SheetError> {
        self.check_catalog(catalog)?;
        self.allocations
            .set_percentage(catalog, part_id, cut_id, percent)?;
        Ok(())
    }

    /// Repair the sheet in place and resync allocations.
    ///
    /// # Errors
    ///
    /// Returns [`SheetError::WrongCatalog`] for another species' catalog.
    pub fn normalize(&mut self, catalog: &SpeciesCatalog) -> Result<NormalizeOutcome, SheetError> {
        self.check_catalog(catalog)?;
        let outcome = normalize_catalog(catalog, &self.selections);
        self.selections = outcome.selections.clone();
        self.allocations.sync(catalog, &self.selections);
        Ok(outcome)
    }

    /// Validation plus allocation completeness. A catalog for another species
    /// yields a status that cannot be finalized.
    #[must_use]
    pub fn status(&self, catalog: &SpeciesCatalog) -> SheetStatus {
        if let Err(err) = self.check_catalog(catalog) {
            log::warn!("{err}");
            return SheetStatus {
                validation: ValidationResult::unknown_species(),
                incomplete_allocations: Vec::new(),
                can_finalize: false,
            };
        }
        let validation = validate_catalog(catalog, &self.selections);
        let incomplete_allocations = self
            .allocations
            .incomplete_allocations(catalog, &self.selections);
        let can_finalize = validation.is_valid && incomplete_allocations.is_empty();
        SheetStatus {
            validation,
            incomplete_allocations,
            can_finalize,
        }
    }
}
