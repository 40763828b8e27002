//! Per-cut availability and "what would this disable" previews.
use serde::{Deserialize, Serialize};

use crate::catalog::{CutChoice, CutId, SpeciesCatalog};
use crate::selection::{ResolvedSelection, SelectionSet};
use crate::validation::disablement;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutAvailability {
    pub cut_id: CutId,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<CutId>,
}

impl CutAvailability {
    fn available(cut_id: &str) -> Self {
        Self {
            cut_id: cut_id.to_string(),
            available: true,
            reason: None,
            caused_by: None,
        }
    }
}

fn availability_of(
    catalog: &SpeciesCatalog,
    selected: &ResolvedSelection<'_>,
    cut: &CutChoice,
) -> CutAvailability {
    disablement(catalog, selected, cut).map_or_else(
        || CutAvailability::available(&cut.id),
        |disabled| CutAvailability {
            cut_id: disabled.cut_id,
            available: false,
            reason: Some(disabled.reason),
            caused_by: disabled.caused_by,
        },
    )
}

/// Availability of every cut in catalog order. Selected cuts are always
/// available.
#[must_use]
pub fn cut_availability(catalog: &SpeciesCatalog, selections: &SelectionSet) -> Vec<CutAvailability> {
    let selected = ResolvedSelection::resolve(catalog, selections);
    catalog
        .cuts()
        .iter()
        .map(|cut| availability_of(catalog, &selected, cut))
        .collect()
}

/// Cuts that selecting `cut_id` on its own would make unavailable: its
/// `excludes` list plus its exclusive-choice siblings. Unknown cuts disable
/// nothing.
#[must_use]
pub fn would_disable(catalog: &SpeciesCatalog, cut_id: &str) -> Vec<CutId> {
    let Some(cut) = catalog.cut(cut_id) else {
        return Vec::new();
    };
    let mut disabled: Vec<CutId> = Vec::new();
    for target in &cut.excludes {
        if !disabled.contains(target) {
            disabled.push(target.clone());
        }
    }
    if let Some(group) = catalog.exclusive_group(cut) {
        for sibling in catalog.group_members(&group.id) {
            if sibling.id != cut.id && !disabled.contains(&sibling.id) {
                disabled.push(sibling.id.clone());
            }
        }
    }
    disabled
}

/// Availability of one cut under the current selections.
#[must_use]
pub fn can_add_cut(
    catalog: &SpeciesCatalog,
    cut_id: &str,
    selections: &SelectionSet,
) -> CutAvailability {
    let Some(cut) = catalog.cut(cut_id) else {
        return CutAvailability {
            cut_id: cut_id.to_string(),
            available: false,
            reason: Some(format!(
                "{cut_id} is not a {} cut in this catalog",
                catalog.species().display_name().to_lowercase()
            )),
            caused_by: None,
        };
    };
    let selected = ResolvedSelection::resolve(catalog, selections);
    availability_of(catalog, &selected, cut)
}

/// Catalog entries a cut must be selected together with.
#[must_use]
pub fn required_cuts<'a>(catalog: &'a SpeciesCatalog, cut_id: &str) -> Vec<&'a CutChoice> {
    catalog.cut(cut_id).map_or_else(Vec::new, |cut| {
        cut.requires
            .iter()
            .filter_map(|id| catalog.cut(id))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BodyPartDef, CutStyle, GroupingMode, SpeciesCatalogDef};
    use crate::species::Species;

    // Assembled without the integrity check: leg_whole points at a cut that
    // does not exist.
    fn fixture() -> SpeciesCatalog {
        SpeciesCatalog::assemble(SpeciesCatalogDef {
            species: Species::Lamb,
            primals: vec![
                BodyPartDef {
                    id: "leg".to_string(),
                    name: "Leg".to_string(),
                    description: None,
                    grouping: GroupingMode::ExclusiveChoice,
                    cuts: vec![
                        CutChoice::new("leg_whole", "Whole Leg", CutStyle::Roast)
                            .excluding(["shank", "ghost_cut"]),
                        CutChoice::new("leg_steaks", "Leg Steaks", CutStyle::Steak),
                        CutChoice::new("leg_boneless", "Boneless Leg", CutStyle::Roast),
                        CutChoice::new("shank", "Shank", CutStyle::Bones).independent(),
                    ],
                    sub_parts: Vec::new(),
                },
                BodyPartDef {
                    id: "rack".to_string(),
                    name: "Rack".to_string(),
                    description: None,
                    grouping: GroupingMode::None,
                    cuts: vec![
                        CutChoice::new("rack_a", "Rack A", CutStyle::Roast).requiring(["rack_b"]),
                        CutChoice::new("rack_b", "Rack B", CutStyle::Roast).requiring(["rack_a"]),
                    ],
                    sub_parts: Vec::new(),
                },
            ],
        })
        .unwrap_or_else(|err| panic!("fixture: {err}"))
    }

    #[test]
    fn would_disable_lists_excludes_then_siblings() {
        let catalog = fixture();
        assert_eq!(
            would_disable(&catalog, "leg_whole"),
            vec!["shank", "ghost_cut", "leg_steaks", "leg_boneless"]
        );
        assert!(would_disable(&catalog, "shank").is_empty());
        assert!(would_disable(&catalog, "nope").is_empty());
    }

    #[test]
    fn selected_cuts_report_available() {
        let catalog = fixture();
        let selections = SelectionSet::from_ids(["leg_steaks"]);
        let all = cut_availability(&catalog, &selections);
        assert_eq!(all.len(), catalog.cuts().len());
        let steaks = all.iter().find(|a| a.cut_id == "leg_steaks").unwrap();
        assert!(steaks.available);
        let whole = all.iter().find(|a| a.cut_id == "leg_whole").unwrap();
        assert!(!whole.available);
        assert_eq!(whole.caused_by.as_deref(), Some("leg_steaks"));
        assert!(all.iter().find(|a| a.cut_id == "shank").unwrap().available);
    }

    #[test]
    fn can_add_cut_reflects_excludes() {
        let catalog = fixture();
        let selections = SelectionSet::from_ids(["leg_whole"]);
        let shank = can_add_cut(&catalog, "shank", &selections);
        assert!(!shank.available);
        assert_eq!(shank.caused_by.as_deref(), Some("leg_whole"));
        assert!(can_add_cut(&catalog, "rack_a", &selections).available);
        assert!(!can_add_cut(&catalog, "mystery", &selections).available);
    }

    #[test]
    fn required_cuts_resolve_catalog_entries() {
        let catalog = fixture();
        let required = required_cuts(&catalog, "rack_a");
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].name, "Rack B");
        assert!(required_cuts(&catalog, "leg_whole").is_empty());
    }
}
