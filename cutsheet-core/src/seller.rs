//! Seller catalog overlays: which species and cuts a processor offers.
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::ops::Deref;
use thiserror::Error;

use crate::catalog::visit::fold;
use crate::catalog::{
    BodyPartDef, CutChoice, CutId, CutStyle, GroupingMode, SpeciesCatalog, SpeciesCatalogDef,
};
use crate::selection::SelectionSet;
use crate::species::Species;
use crate::validation::{ValidationResult, validate_catalog};

/// Reason stamped on cuts a seller has switched off.
pub const NOT_OFFERED_REASON: &str = "Not offered by this processor";

/// Body part holding a seller's custom cuts in a filtered catalog.
pub const CUSTOM_PART_ID: &str = "seller_custom";

/// An extra cut a seller offers beyond the built-in catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCutDef {
    pub species: Species,
    pub id: CutId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "CustomCutDef::default_style")]
    pub style: CutStyle,
}

impl CustomCutDef {
    const fn default_style() -> CutStyle {
        CutStyle::Whole
    }
}

/// A seller's catalog settings. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SellerCatalogConfig {
    /// Species the seller processes; absent means all.
    #[serde(default)]
    pub enabled_species: Option<BTreeSet<Species>>,
    #[serde(default)]
    pub disabled_cuts: BTreeSet<CutId>,
    #[serde(default)]
    pub custom_cuts: Vec<CustomCutDef>,
    /// Hanging-weight bounds in pounds.
    #[serde(default)]
    pub min_hanging_weight: Option<u32>,
    #[serde(default)]
    pub max_hanging_weight: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Errors raised when seller configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SellerConfigError {
    #[error("minimum hanging weight {min} lb exceeds maximum {max} lb")]
    WeightBounds { min: u32, max: u32 },
    #[error("custom {species} cut #{index} has an empty id")]
    EmptyCustomId { species: Species, index: usize },
    #[error("custom cut '{id}' has an empty name")]
    EmptyCustomName { id: CutId },
    #[error("custom {species} cut '{id}' is declared more than once")]
    DuplicateCustomCut { species: Species, id: CutId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeightRequirements {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl SellerCatalogConfig {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a seller config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the config's own invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SellerConfigError> {
        if let (Some(min), Some(max)) = (self.min_hanging_weight, self.max_hanging_weight) {
            if min > max {
                return Err(SellerConfigError::WeightBounds { min, max });
            }
        }
        let mut seen = HashSet::new();
        for (index, custom) in self.custom_cuts.iter().enumerate() {
            if custom.id.trim().is_empty() {
                return Err(SellerConfigError::EmptyCustomId {
                    species: custom.species,
                    index,
                });
            }
            if custom.name.trim().is_empty() {
                return Err(SellerConfigError::EmptyCustomName {
                    id: custom.id.clone(),
                });
            }
            if !seen.insert((custom.species, custom.id.as_str())) {
                return Err(SellerConfigError::DuplicateCustomCut {
                    species: custom.species,
                    id: custom.id.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn offers_species(&self, species: Species) -> bool {
        self.enabled_species
            .as_ref()
            .is_none_or(|enabled| enabled.contains(&species))
    }
}

/// A catalog as one seller offers it. Without a config this simply wraps the
/// built-in catalog.
#[derive(Debug, Clone)]
pub struct FilteredCatalog<'a> {
    catalog: Cow<'a, SpeciesCatalog>,
}

impl FilteredCatalog<'_> {
    #[must_use]
    pub fn catalog(&self) -> &SpeciesCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn is_filtered(&self) -> bool {
        matches!(self.catalog, Cow::Owned(_))
    }

    pub fn enabled_cuts(&self) -> impl Iterator<Item = &CutChoice> {
        self.catalog.cuts().iter().filter(|cut| !cut.disabled)
    }

    #[must_use]
    pub fn is_cut_enabled(&self, cut_id: &str) -> bool {
        self.catalog.cut(cut_id).is_some_and(|cut| !cut.disabled)
    }

    /// Run validation against this seller view.
    #[must_use]
    pub fn validate(&self, selections: &SelectionSet) -> ValidationResult {
        validate_catalog(&self.catalog, selections)
    }

    #[must_use]
    pub fn into_owned(self) -> SpeciesCatalog {
        self.catalog.into_owned()
    }
}

impl Deref for FilteredCatalog<'_> {
    type Target = SpeciesCatalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}

/// Apply a seller config to a catalog. `None` config returns the catalog
/// unchanged; a config that does not offer the species returns `None`.
/// Disabled cuts are stamped, and body parts left without any enabled cut
/// (including through their sub-parts) are pruned.
#[must_use]
pub fn apply_config<'a>(
    catalog: &'a SpeciesCatalog,
    config: Option<&SellerCatalogConfig>,
) -> Option<FilteredCatalog<'a>> {
    let Some(config) = config else {
        return Some(FilteredCatalog {
            catalog: Cow::Borrowed(catalog),
        });
    };
    let species = catalog.species();
    if !config.offers_species(species) {
        return None;
    }

    let mut primals: Vec<BodyPartDef> = catalog
        .primals()
        .iter()
        .filter_map(|primal| {
            fold(primal, &mut |part, children: Vec<Option<BodyPartDef>>| {
                let cuts: Vec<CutChoice> = part
                    .cuts
                    .iter()
                    .filter_map(|id| catalog.cut(id))
                    .map(|cut| stamp(cut, config))
                    .collect();
                let sub_parts: Vec<BodyPartDef> = children.into_iter().flatten().collect();
                let has_enabled = cuts.iter().any(|cut| !cut.disabled);
                (has_enabled || !sub_parts.is_empty()).then(|| BodyPartDef {
                    id: part.id.clone(),
                    name: part.name.clone(),
                    description: part.description.clone(),
                    grouping: part.grouping,
                    cuts,
                    sub_parts,
                })
            })
        })
        .collect();

    let custom: Vec<CutChoice> = custom_cuts(Some(config), species)
        .into_iter()
        .filter(|cut| {
            let collides = catalog.contains(&cut.id);
            if collides {
                log::warn!(
                    "custom {species} cut '{}' collides with a catalog cut and is ignored",
                    cut.id
                );
            }
            !collides
        })
        .collect();
    if !custom.is_empty() {
        primals.push(BodyPartDef {
            id: CUSTOM_PART_ID.to_string(),
            name: "Custom Cuts".to_string(),
            description: Some("Additional cuts offered by this processor".to_string()),
            grouping: GroupingMode::None,
            cuts: custom,
            sub_parts: Vec::new(),
        });
    }

    match SpeciesCatalog::assemble(SpeciesCatalogDef { species, primals }) {
        Ok(filtered) => Some(FilteredCatalog {
            catalog: Cow::Owned(filtered),
        }),
        Err(err) => {
            log::error!("seller view of the {species} catalog could not be built: {err}");
            None
        }
    }
}

fn stamp(cut: &CutChoice, config: &SellerCatalogConfig) -> CutChoice {
    let mut cut = cut.clone();
    if config.disabled_cuts.contains(&cut.id) {
        cut.disabled = true;
        cut.disabled_reason = Some(NOT_OFFERED_REASON.to_string());
    }
    cut
}

/// Ids of cuts the seller offers for this catalog's species, in catalog order.
#[must_use]
pub fn enabled_cut_ids(catalog: &SpeciesCatalog, config: Option<&SellerCatalogConfig>) -> Vec<CutId> {
    apply_config(catalog, config).map_or_else(Vec::new, |view| {
        view.enabled_cuts().map(|cut| cut.id.clone()).collect()
    })
}

#[must_use]
pub fn is_cut_enabled(
    catalog: &SpeciesCatalog,
    cut_id: &str,
    config: Option<&SellerCatalogConfig>,
) -> bool {
    apply_config(catalog, config).is_some_and(|view| view.is_cut_enabled(cut_id))
}

#[must_use]
pub fn producer_notes(config: Option<&SellerCatalogConfig>) -> Option<&str> {
    config.and_then(|c| c.notes.as_deref())
}

#[must_use]
pub fn weight_requirements(config: Option<&SellerCatalogConfig>) -> WeightRequirements {
    config.map_or_else(WeightRequirements::default, |c| WeightRequirements {
        min: c.min_hanging_weight,
        max: c.max_hanging_weight,
    })
}

/// The seller's extra cuts for a species, in the catalog's cut shape. Custom
/// cuts carry no constraint edges and are independent of grouping rules.
#[must_use]
pub fn custom_cuts(config: Option<&SellerCatalogConfig>, species: Species) -> Vec<CutChoice> {
    let Some(config) = config else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    config
        .custom_cuts
        .iter()
        .filter(|custom| custom.species == species && seen.insert(custom.id.as_str()))
        .map(|custom| {
            let mut cut = CutChoice::new(custom.id.clone(), custom.name.clone(), custom.style)
                .independent();
            cut.description.clone_from(&custom.description);
            cut
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;

    fn fixture() -> SpeciesCatalog {
        SpeciesCatalog::from_def(SpeciesCatalogDef {
            species: Species::Pork,
            primals: vec![
                BodyPartDef {
                    id: "belly".to_string(),
                    name: "Belly".to_string(),
                    description: None,
                    grouping: GroupingMode::None,
                    cuts: vec![
                        CutChoice::new("bacon", "Bacon", CutStyle::Cured),
                        CutChoice::new("fresh_belly", "Fresh Belly", CutStyle::Whole),
                    ],
                    sub_parts: Vec::new(),
                },
                BodyPartDef {
                    id: "shoulder".to_string(),
                    name: "Shoulder".to_string(),
                    description: None,
                    grouping: GroupingMode::None,
                    cuts: Vec::new(),
                    sub_parts: vec![BodyPartDef {
                        id: "butt".to_string(),
                        name: "Butt".to_string(),
                        description: None,
                        grouping: GroupingMode::ExclusiveChoice,
                        cuts: vec![
                            CutChoice::new("butt_roast", "Butt Roast", CutStyle::Roast),
                            CutChoice::new("butt_steaks", "Butt Steaks", CutStyle::Steak),
                        ],
                        sub_parts: Vec::new(),
                    }],
                },
            ],
        })
        .unwrap()
    }

    fn config_disabling(ids: &[&str]) -> SellerCatalogConfig {
        SellerCatalogConfig {
            disabled_cuts: ids.iter().map(ToString::to_string).collect(),
            ..SellerCatalogConfig::default()
        }
    }

    #[test]
    fn no_config_wraps_catalog_unchanged() {
        let catalog = fixture();
        let view = apply_config(&catalog, None).unwrap();
        assert!(!view.is_filtered());
        assert_eq!(view.cuts().len(), catalog.cuts().len());
        assert_eq!(enabled_cut_ids(&catalog, None).len(), 4);
    }

    #[test]
    fn species_not_offered_returns_none() {
        let catalog = fixture();
        let config = SellerCatalogConfig {
            enabled_species: Some(BTreeSet::from([Species::Beef])),
            ..SellerCatalogConfig::default()
        };
        assert!(apply_config(&catalog, Some(&config)).is_none());
        assert!(enabled_cut_ids(&catalog, Some(&config)).is_empty());
        assert!(!is_cut_enabled(&catalog, "bacon", Some(&config)));
    }

    #[test]
    fn disabling_marks_only_that_cut() {
        let catalog = fixture();
        let config = config_disabling(&["bacon"]);
        let view = apply_config(&catalog, Some(&config)).unwrap();
        let bacon = view.cut("bacon").unwrap();
        assert!(bacon.disabled);
        assert_eq!(bacon.disabled_reason.as_deref(), Some(NOT_OFFERED_REASON));
        assert!(view.is_cut_enabled("fresh_belly"));
        assert_eq!(view.cuts().iter().filter(|c| c.disabled).count(), 1);
    }

    #[test]
    fn parts_without_enabled_cuts_are_pruned_bottom_up() {
        let catalog = fixture();
        let config = config_disabling(&["butt_roast", "butt_steaks"]);
        let view = apply_config(&catalog, Some(&config)).unwrap();
        assert!(view.part("butt").is_none());
        assert!(view.part("shoulder").is_none());
        assert!(view.part("belly").is_some());

        let partial = config_disabling(&["butt_roast"]);
        let view = apply_config(&catalog, Some(&partial)).unwrap();
        assert!(view.part("shoulder").is_some());
        assert!(view.part("butt").is_some());
    }

    #[test]
    fn seller_disabled_cuts_show_as_disabled_options() {
        let catalog = fixture();
        let config = config_disabling(&["bacon"]);
        let view = apply_config(&catalog, Some(&config)).unwrap();
        let result = view.validate(&SelectionSet::from_ids(["butt_roast"]));
        let bacon = result.disabled("bacon").unwrap();
        assert_eq!(bacon.reason, NOT_OFFERED_REASON);
        assert!(bacon.caused_by.is_none());
    }

    #[test]
    fn selected_cut_the_seller_disabled_blocks_finalizing() {
        use crate::selection::Selection;
        use crate::sheet::CutSheet;
        use crate::validation::ErrorKind;

        let catalog = fixture();
        let config = config_disabling(&["bacon"]);
        let view = apply_config(&catalog, Some(&config)).unwrap();
        let result = view.validate(&SelectionSet::from_ids(["bacon", "fresh_belly"]));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::NotOffered);
        assert_eq!(result.errors[0].cut_id, "bacon");
        assert!(result.errors[0].message.contains(NOT_OFFERED_REASON));

        let sheet = CutSheet::from_parts(
            Species::Pork,
            [Selection::new("bacon")].into_iter().collect(),
            crate::allocation::AllocationMap::new(),
        );
        assert!(!sheet.status(&view).can_finalize);
        assert!(sheet.status(&catalog).can_finalize);
    }

    #[test]
    fn custom_cuts_join_a_custom_part() {
        let catalog = fixture();
        let config: SellerCatalogConfig = serde_json::from_str(
            r#"{
                "custom_cuts": [
                    {"species": "pork", "id": "porchetta", "name": "Porchetta", "style": "roast"},
                    {"species": "pork", "id": "bacon", "name": "House Bacon"},
                    {"species": "beef", "id": "pastrami", "name": "Pastrami"}
                ]
            }"#,
        )
        .unwrap();
        let customs = custom_cuts(Some(&config), Species::Pork);
        assert_eq!(customs.len(), 2);
        assert!(customs[0].independent);

        let view = apply_config(&catalog, Some(&config)).unwrap();
        assert_eq!(view.owner("porchetta").unwrap().id, CUSTOM_PART_ID);
        assert_eq!(view.cut("bacon").unwrap().name, "Bacon");
        assert!(!view.contains("pastrami"));
    }

    #[test]
    fn pass_through_reads() {
        let config = SellerCatalogConfig {
            min_hanging_weight: Some(450),
            notes: Some("Dry aged 14 days".to_string()),
            ..SellerCatalogConfig::default()
        };
        assert_eq!(producer_notes(Some(&config)), Some("Dry aged 14 days"));
        assert_eq!(producer_notes(None), None);
        assert_eq!(
            weight_requirements(Some(&config)),
            WeightRequirements {
                min: Some(450),
                max: None
            }
        );
        assert_eq!(weight_requirements(None), WeightRequirements::default());
    }

    #[test]
    fn config_validation_catches_bad_bounds_and_customs() {
        let mut config = SellerCatalogConfig {
            min_hanging_weight: Some(900),
            max_hanging_weight: Some(400),
            ..SellerCatalogConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SellerConfigError::WeightBounds { min: 900, max: 400 })
        );
        config.max_hanging_weight = Some(1200);
        assert_eq!(config.validate(), Ok(()));
        config.custom_cuts.push(CustomCutDef {
            species: Species::Beef,
            id: " ".to_string(),
            name: "Blank".to_string(),
            description: None,
            style: CutStyle::Roast,
        });
        assert!(matches!(
            config.validate(),
            Err(SellerConfigError::EmptyCustomId { index: 0, .. })
        ));
    }

    #[test]
    fn builtin_catalog_filters_cleanly() {
        let schema = SchemaCatalog::load_from_static().unwrap();
        let beef = schema.species(Species::Beef).unwrap();
        let config = config_disabling(&["tbone", "porterhouse"]);
        let view = apply_config(beef, Some(&config)).unwrap();
        assert!(!view.is_cut_enabled("tbone"));
        assert!(view.is_cut_enabled("nystrip"));
        assert_eq!(view.cuts().len(), beef.cuts().len());
    }
}
